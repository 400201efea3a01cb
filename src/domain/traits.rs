// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer asks for a site's profiles through
// this trait and never learns which file format they came from.
//
// Implementations:
//   - Era5Loader -> reads netCDF files laid out by site/variable/period
//   - (tests)    -> in-memory sources built from synthetic grids

use anyhow::Result;
use crate::domain::profile::SiteProfiles;

// ─── ProfileSource ────────────────────────────────────────────────────────────
/// Any component that can load the temperature, humidity and
/// vertical velocity profiles of one site.
pub trait ProfileSource {
    /// Load every profile available for `geo_id` (e.g. "BNF").
    fn load_site(&self, geo_id: &str) -> Result<SiteProfiles>;
}
