// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing what the system works on:
// vertical profiles of an atmospheric variable sampled on a
// time x pressure-level grid, grouped per site.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Time x level grids and the per-site bundle of them
pub mod profile;

// Core abstractions (traits) that other layers implement
pub mod traits;
