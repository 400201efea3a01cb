// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from netCDF files on disk to tensor batches.
//
//   {site}-{t,w,q}-{period}.nc
//       │
//       ▼
//   Era5Loader        → reads the grids and their time/pressure axes
//       │
//       ▼
//   Standardizer      → removes level means, divides by one global std
//       │
//       ▼
//   build_samples     → state at t (or t-n+1..t) → w at t+1
//       │
//       ▼
//   splitters         → training period / test period / validation
//       │
//       ▼
//   ProfileDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   ProfileBatcher    → stacks samples into float tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads ERA5 site profiles from netCDF classic files
pub mod loader;

/// Per-level anomaly / global-scale standardization
pub mod preprocessor;

/// Forecast samples and Burn's Dataset implementation
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Chronological and shuffled splits
pub mod splitter;
