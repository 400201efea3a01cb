// ============================================================
// Layer 6 - Report Writer
// ============================================================
// Writes the tables behind the forecast figures:
//
//   profile_bias.csv  - per level: mean observed w, mean
//                       predicted w and their difference over
//                       the test period
//   forecast.csv      - long-format time-height table of
//                       observed vs predicted w
//   latent.csv        - autoencoder latent codes, one row per sample
//   run_config.json   - the configuration of the run
//
// All files land in the run's output directory.

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Mean of each column of equal-length rows.
pub fn column_means(rows: &[Vec<f32>]) -> Vec<f64> {
    let width = rows.first().map_or(0, |r| r.len());
    let mut sums = vec![0.0f64; width];
    for row in rows {
        for (s, &v) in sums.iter_mut().zip(row) {
            *s += v as f64;
        }
    }
    let n = rows.len().max(1) as f64;
    sums.into_iter().map(|s| s / n).collect()
}

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    fn create(&self, name: &str) -> Result<(PathBuf, BufWriter<fs::File>)> {
        let path = self.dir.join(name);
        let file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        Ok((path, BufWriter::new(file)))
    }

    /// Per-level mean observed / predicted profile and their difference.
    pub fn write_profile_bias(
        &self,
        pressures: &[f64],
        observed:  &[Vec<f32>],
        predicted: &[Vec<f32>],
    ) -> Result<PathBuf> {
        ensure!(
            observed.len() == predicted.len(),
            "{} observed rows but {} predicted rows",
            observed.len(),
            predicted.len(),
        );
        let obs_mean  = column_means(observed);
        let pred_mean = column_means(predicted);

        let (path, mut f) = self.create("profile_bias.csv")?;
        writeln!(f, "pressure,observed_mean,predicted_mean,bias")?;
        for ((p, o), m) in pressures.iter().zip(&obs_mean).zip(&pred_mean) {
            writeln!(f, "{},{:.6e},{:.6e},{:.6e}", p, o, m, m - o)?;
        }
        f.flush()?;

        tracing::info!("Wrote mean profile comparison to '{}'", path.display());
        Ok(path)
    }

    /// Time-height table for the first `max_steps` rows.
    pub fn write_forecast(
        &self,
        times:     &[f64],
        pressures: &[f64],
        observed:  &[Vec<f32>],
        predicted: &[Vec<f32>],
        max_steps: usize,
    ) -> Result<PathBuf> {
        ensure!(
            times.len() >= observed.len().min(max_steps)
                && observed.len() == predicted.len(),
            "forecast rows and time axis do not line up",
        );

        let (path, mut f) = self.create("forecast.csv")?;
        writeln!(f, "time,pressure,observed,predicted,error")?;
        for ((t, obs), pred) in times.iter().zip(observed).zip(predicted).take(max_steps) {
            for ((p, o), m) in pressures.iter().zip(obs).zip(pred) {
                writeln!(f, "{},{},{:.6e},{:.6e},{:.6e}", t, p, o, m, m - o)?;
            }
        }
        f.flush()?;

        tracing::info!("Wrote forecast table to '{}'", path.display());
        Ok(path)
    }

    /// One row of latent codes per sample.
    pub fn write_latent(&self, codes: &[Vec<f32>]) -> Result<PathBuf> {
        let width = codes.first().map_or(0, |r| r.len());
        let (path, mut f) = self.create("latent.csv")?;

        let header: Vec<String> = (0..width).map(|i| format!("z{i}")).collect();
        writeln!(f, "{}", header.join(","))?;
        for row in codes {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
            writeln!(f, "{}", cells.join(","))?;
        }
        f.flush()?;

        tracing::info!("Wrote {} latent codes to '{}'", codes.len(), path.display());
        Ok(path)
    }

    pub fn write_run_config<T: Serialize>(&self, cfg: &T) -> Result<PathBuf> {
        let path = self.dir.join("run_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_means() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(column_means(&rows), vec![2.0, 4.0]);
        assert!(column_means(&[]).is_empty());
    }

    #[test]
    fn test_profile_bias_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let obs    = vec![vec![0.0, 1.0], vec![0.0, 3.0]];
        let pred   = vec![vec![1.0, 2.0], vec![1.0, 2.0]];

        let path  = writer.write_profile_bias(&[1000.0, 500.0], &obs, &pred).unwrap();
        let text  = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1000,"));
        // level 500: observed mean 2, predicted mean 2, no bias
        assert!(lines[2].ends_with("0.000000e0"), "{}", lines[2]);
    }

    #[test]
    fn test_forecast_respects_step_limit() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();
        let rows   = vec![vec![0.1, 0.2]; 5];

        let path = writer
            .write_forecast(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1000.0, 500.0], &rows, &rows, 3)
            .unwrap();
        let text = fs::read_to_string(path).unwrap();
        // header + 3 steps x 2 levels
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn test_latent_and_config() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path()).unwrap();

        let path = writer.write_latent(&[vec![0.5, -1.0, 2.0]]).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().next(), Some("z0,z1,z2"));

        let path = writer.write_run_config(&serde_json::json!({ "epochs": 3 })).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("\"epochs\": 3"));
    }
}
