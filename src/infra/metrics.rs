// ============================================================
// Layer 6 - Metrics
// ============================================================
// Scores predictions and records training progress to CSV.
//
// Two scores are tracked for every logging step:
//   - loss:     mean squared error over every predicted element
//   - accuracy: share of elements whose predicted sign matches
//               the target sign. The trainer only sees
//               standardized targets, so during training this
//               is the sign of the anomaly from the level mean;
//               the forecast test score is taken in physical
//               units, where it is the direction of motion
//
// Output file: {output_dir}/metrics.csv
//
//   epoch,train_loss,val_loss,accuracy
//   10,0.981200,0.990100,0.561000
//   20,0.875300,0.902000,0.603000
//
// val_loss is left empty when training runs without a
// validation set.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// Mean of squared differences; NaN for empty input.
pub fn mean_squared_error(pred: &[f32], target: &[f32]) -> f64 {
    let mut acc = ScoreAccumulator::default();
    acc.add(pred, target);
    acc.mse()
}

/// Share of elements where prediction and target have the same sign.
pub fn sign_agreement(pred: &[f32], target: &[f32]) -> f64 {
    let mut acc = ScoreAccumulator::default();
    acc.add(pred, target);
    acc.accuracy()
}

/// Running totals so scores can be accumulated batch by batch.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    sq_err_sum:  f64,
    sign_hits:   usize,
    count:       usize,
}

impl ScoreAccumulator {
    pub fn add(&mut self, pred: &[f32], target: &[f32]) {
        for (&p, &y) in pred.iter().zip(target) {
            let d = p as f64 - y as f64;
            self.sq_err_sum += d * d;
            if (p >= 0.0) == (y >= 0.0) {
                self.sign_hits += 1;
            }
            self.count += 1;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mse(&self) -> f64 {
        if self.count == 0 { f64::NAN } else { self.sq_err_sum / self.count as f64 }
    }

    pub fn accuracy(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sign_hits as f64 / self.count as f64 }
    }
}

/// One row of metrics for a logging step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (starts at 1)
    pub epoch: usize,

    /// Mean MSE over the training samples seen this epoch
    pub train_loss: f64,

    /// MSE on the validation set, if one was held out
    pub val_loss: Option<f64>,

    /// Anomaly sign agreement on the training samples, in [0.0, 1.0]
    pub accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: Option<f64>, accuracy: f64) -> Self {
        Self { epoch, train_loss, val_loss, accuracy }
    }

    /// Returns true if this step's validation loss beats `best_val_loss`
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss.is_some_and(|v| v < best_val_loss)
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the output directory and start a fresh metrics.csv.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,accuracy")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        let val = m.val_loss.map(|v| format!("{v:.6}")).unwrap_or_default();
        writeln!(f, "{},{:.6},{},{:.6}", m.epoch, m.train_loss, val, m.accuracy)?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
