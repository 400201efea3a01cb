// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Each use case wires the lower layers together for one goal.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// One-step vertical velocity forecast
pub mod forecast_use_case;

// Autoencoder on synthetic data or site profiles
pub mod autoencode_use_case;

// Site overview before training
pub mod inspect_use_case;
