// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Output concerns shared by the use cases:
//
//   metrics.rs - scoring (MSE, sign agreement) and the per-epoch
//                metrics.csv log written during training
//
//   report.rs  - tables behind the forecast figures, autoencoder
//                latent codes and the run's configuration
//
// Nothing here touches model weights; trained networks live
// only for the duration of a run.

/// Scores and training metrics CSV logger
pub mod metrics;

/// Forecast / latent tables and run configuration
pub mod report;
