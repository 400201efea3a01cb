// ============================================================
// Layer 3 - Profile Domain Types
// ============================================================
// A ProfileSeries is one variable on a time x level grid,
// stored row-major: row i is the full vertical profile at
// time step i, ordered like the `pressures` axis.
//
//   values = [ p(t0,l0) p(t0,l1) ... p(t0,lL) p(t1,l0) ... ]
//
// SiteProfiles bundles the three variables the forecast needs
// together with their shared time and pressure axes.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// One atmospheric variable sampled on a time x level grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeries {
    /// Short variable name as used in the file names ("t", "q", "w")
    pub variable: String,

    /// Row-major grid values, `n_time * n_level` long
    pub values: Vec<f32>,

    pub n_time:  usize,
    pub n_level: usize,
}

impl ProfileSeries {
    /// Build a series, checking the buffer matches the grid shape.
    pub fn new(
        variable: impl Into<String>,
        values:   Vec<f32>,
        n_time:   usize,
        n_level:  usize,
    ) -> Result<Self> {
        let variable = variable.into();
        ensure!(
            values.len() == n_time * n_level,
            "variable '{}' has {} values, expected {} x {} = {}",
            variable,
            values.len(),
            n_time,
            n_level,
            n_time * n_level,
        );
        Ok(Self { variable, values, n_time, n_level })
    }

    /// The vertical profile at time step `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.n_level;
        &self.values[start..start + self.n_level]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks(0) panics, and a grid without levels has no rows anyway
        self.values.chunks(self.n_level.max(1)).take(self.n_time)
    }

    /// Mean over time for each level (numpy `mean(x, axis=0)`).
    pub fn level_means(&self) -> Vec<f32> {
        let mut sums = vec![0.0f64; self.n_level];
        for row in self.rows() {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v as f64;
            }
        }
        let n = self.n_time.max(1) as f64;
        sums.into_iter().map(|s| (s / n) as f32).collect()
    }

    /// Per-level standard deviation over time (population, ddof = 0).
    pub fn level_stds(&self) -> Vec<f32> {
        let means = self.level_means();
        let mut sq = vec![0.0f64; self.n_level];
        for row in self.rows() {
            for ((s, &v), &m) in sq.iter_mut().zip(row).zip(&means) {
                let d = v as f64 - m as f64;
                *s += d * d;
            }
        }
        let n = self.n_time.max(1) as f64;
        sq.into_iter().map(|s| (s / n).sqrt() as f32).collect()
    }

    /// Population standard deviation over every element of the grid
    /// (numpy `std(x)` with no axis).
    pub fn global_std(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let n    = self.values.len() as f64;
        let mean = self.values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var  = self
            .values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        var.sqrt() as f32
    }
}

/// The temperature, humidity and vertical velocity profiles of one site.
#[derive(Debug, Clone)]
pub struct SiteProfiles {
    /// Site identifier used in the file names (e.g. "BNF")
    pub geo_id: String,

    /// `valid_time` axis, in the units stored in the file
    pub times: Vec<f64>,

    /// Pressure levels in hPa
    pub pressures: Vec<f64>,

    pub temperature:       ProfileSeries,
    pub humidity:          ProfileSeries,
    pub vertical_velocity: ProfileSeries,
}

impl SiteProfiles {
    /// Bundle the three series, checking they share the same grid.
    pub fn new(
        geo_id:            impl Into<String>,
        times:             Vec<f64>,
        pressures:         Vec<f64>,
        temperature:       ProfileSeries,
        humidity:          ProfileSeries,
        vertical_velocity: ProfileSeries,
    ) -> Result<Self> {
        for series in [&temperature, &humidity, &vertical_velocity] {
            ensure!(
                series.n_time == times.len(),
                "variable '{}' has {} time steps but the time axis has {}",
                series.variable,
                series.n_time,
                times.len(),
            );
            ensure!(
                series.n_level == pressures.len(),
                "variable '{}' has {} levels but the pressure axis has {}",
                series.variable,
                series.n_level,
                pressures.len(),
            );
        }
        Ok(Self {
            geo_id: geo_id.into(),
            times,
            pressures,
            temperature,
            humidity,
            vertical_velocity,
        })
    }

    pub fn n_time(&self) -> usize {
        self.times.len()
    }

    pub fn n_level(&self) -> usize {
        self.pressures.len()
    }

    /// Look a series up by its short name.
    pub fn series(&self, variable: &str) -> Option<&ProfileSeries> {
        match variable {
            "t" => Some(&self.temperature),
            "q" => Some(&self.humidity),
            "w" => Some(&self.vertical_velocity),
            _   => None,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ProfileSeries {
        // 3 time steps x 2 levels
        ProfileSeries::new("t", vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0], 3, 2).unwrap()
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        assert!(ProfileSeries::new("t", vec![1.0, 2.0, 3.0], 2, 2).is_err());
    }

    #[test]
    fn test_row_access() {
        let s = grid();
        assert_eq!(s.row(1), &[2.0, 20.0]);
        assert_eq!(s.rows().count(), 3);
    }

    #[test]
    fn test_level_means() {
        assert_eq!(grid().level_means(), vec![2.0, 20.0]);
    }

    #[test]
    fn test_global_std_is_population_std() {
        let s = ProfileSeries::new("q", vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 4, 2).unwrap();
        assert!((s.global_std() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_site_rejects_mismatched_axes() {
        let t = grid();
        let q = grid();
        let w = grid();
        let ok = SiteProfiles::new("BNF", vec![0.0, 1.0, 2.0], vec![1000.0, 500.0], t.clone(), q.clone(), w.clone());
        assert!(ok.is_ok());
        let bad = SiteProfiles::new("BNF", vec![0.0, 1.0], vec![1000.0, 500.0], t, q, w);
        assert!(bad.is_err());
    }

    #[test]
    fn test_series_lookup() {
        let site = SiteProfiles::new(
            "BNF", vec![0.0, 1.0, 2.0], vec![1000.0, 500.0], grid(), grid(), grid(),
        ).unwrap();
        assert!(site.series("w").is_some());
        assert!(site.series("u").is_none());
    }
}
