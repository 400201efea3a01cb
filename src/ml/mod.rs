// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All network definitions and the optimisation loop live here.
//
//   model.rs     - AnnRegressor (Linear → ReLU → Linear) and
//                  Autoencoder (encoder / bottleneck / decoder),
//                  plus the Predictor trait the trainer fits
//
//   trainer.rs   - Fixed-epoch loop: forward, MSE loss,
//                  backward, Adam step, periodic logging
//
//   predictor.rs - Runs a trained model over held-out samples
//
// Training runs on Autodiff<NdArray>; evaluation uses the
// inner NdArray backend through model.valid().
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kingma & Ba (2015) Adam

/// Feed-forward regressor and autoencoder definitions
pub mod model;

/// Training loop with optional validation
pub mod trainer;

/// Batch prediction on the held-out period
pub mod predictor;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
pub type EvalBackend  = burn::backend::NdArray;
