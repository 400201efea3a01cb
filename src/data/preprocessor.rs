// ============================================================
// Layer 4 - Profile Standardizer
// ============================================================
// Puts temperature, humidity and vertical velocity on a common
// scale before they are stacked into one input vector.
//
//   z(i, l) = (x(i, l) - mean_i x(·, l)) / std(x)
//
// The mean is taken per level over time, which removes the
// climatological vertical structure; the scale is a single
// standard deviation over the whole grid, so the relative
// amplitude between levels is preserved.

use crate::domain::profile::ProfileSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    /// Per-level time mean subtracted before scaling
    pub level_means: Vec<f32>,

    /// Single divisor applied to every element
    pub scale: f32,
}

impl Standardizer {
    /// Fit level means and the global scale on `series`.
    pub fn fit(series: &ProfileSeries) -> Self {
        let level_means = series.level_means();
        let mut scale   = series.global_std();

        if !scale.is_finite() || scale == 0.0 {
            tracing::warn!(
                "Variable '{}' has zero or non-finite spread; using scale 1.0",
                series.variable
            );
            scale = 1.0;
        }

        tracing::debug!("Standardizer for '{}': scale={:.6}", series.variable, scale);
        Self { level_means, scale }
    }

    /// Standardize one profile.
    pub fn apply_row(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(&self.level_means)
            .map(|(&x, &m)| (x - m) / self.scale)
            .collect()
    }

    /// Standardize every row of `series`.
    pub fn apply(&self, series: &ProfileSeries) -> ProfileSeries {
        let values = series.rows().flat_map(|row| self.apply_row(row)).collect();
        ProfileSeries {
            variable: series.variable.clone(),
            values,
            n_time:  series.n_time,
            n_level: series.n_level,
        }
    }

    /// Map a standardized profile back to physical units.
    pub fn invert_row(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(&self.level_means)
            .map(|(&z, &m)| z * self.scale + m)
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> ProfileSeries {
        ProfileSeries::new("w", vec![1.0, 10.0, 3.0, 30.0], 2, 2).unwrap()
    }

    #[test]
    fn test_fit_uses_level_means_and_global_std() {
        let s  = series();
        let st = Standardizer::fit(&s);
        assert_eq!(st.level_means, vec![2.0, 20.0]);
        assert!((st.scale - s.global_std()).abs() < 1e-6);
    }

    #[test]
    fn test_standardized_levels_have_zero_mean() {
        let z = Standardizer::fit(&series()).apply(&series());
        for m in z.level_means() {
            assert!(m.abs() < 1e-6);
        }
    }

    #[test]
    fn test_invert_restores_physical_units() {
        let st  = Standardizer::fit(&series());
        let z   = st.apply_row(&[3.0, 30.0]);
        let raw = st.invert_row(&z);
        assert!((raw[0] - 3.0).abs() < 1e-5);
        assert!((raw[1] - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_constant_series_falls_back_to_unit_scale() {
        let s  = ProfileSeries::new("q", vec![5.0; 6], 3, 2).unwrap();
        let st = Standardizer::fit(&s);
        assert_eq!(st.scale, 1.0);
        assert_eq!(st.apply_row(&[5.0, 5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_non_finite_spread_falls_back_to_unit_scale() {
        let s  = ProfileSeries::new("w", vec![1.0, f32::NAN, 3.0, 4.0], 2, 2).unwrap();
        let st = Standardizer::fit(&s);
        assert_eq!(st.scale, 1.0);
        assert_eq!(st.level_means[0], 2.0);
    }
}
