// ============================================================
// Layer 2 - ForecastUseCase
// ============================================================
// Orchestrates the one-step vertical velocity forecast:
//
//   Step 1: Load t, q, w profiles for the site   (Layer 4 - data)
//   Step 2: Standardize each variable            (Layer 4 - data)
//   Step 3: Build x(t) → w(t+1) samples          (Layer 4 - data)
//   Step 4: Split training / test period         (Layer 4 - data)
//   Step 5: Carve out a validation set           (Layer 4 - data)
//   Step 6: Train the feed-forward regressor     (Layer 5 - ml)
//   Step 7: Predict the test period              (Layer 5 - ml)
//   Step 8: Back to physical units and report    (Layer 6 - infra)

use anyhow::{ensure, Result};
use burn::{module::AutodiffModule, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{build_samples, ProfileDataset, SampleSpec},
    loader::{Era5Loader, DEFAULT_PERIOD},
    preprocessor::Standardizer,
    splitter::{split_chronological, split_train_val},
};
use crate::domain::traits::ProfileSource;
use crate::infra::{
    metrics::{MetricsLogger, ScoreAccumulator},
    report::ReportWriter,
};
use crate::ml::{
    model::AnnRegressorConfig,
    predictor::predict_rows,
    trainer::{fit, FitConfig},
    EvalBackend, TrainBackend,
};

// ─── Forecast Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub data_dir:     String,
    pub site:         String,
    pub period:       String,
    pub output_dir:   String,
    /// Number of leading samples used for training (the rest is test)
    pub n_train:      usize,
    pub hidden_size:  usize,
    pub sample_spec:  SampleSpec,
    /// Share of the training window held out for validation
    pub val_fraction: f64,
    /// Test steps written to forecast.csv
    pub report_steps: usize,
    pub fit:          FitConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            data_dir:     ".".to_string(),
            site:         "BNF".to_string(),
            period:       DEFAULT_PERIOD.to_string(),
            output_dir:   "runs/forecast".to_string(),
            n_train:      10_000,
            hidden_size:  64,
            sample_spec:  SampleSpec::default(),
            val_fraction: 0.0,
            report_steps: 1000,
            fit:          FitConfig::default(),
        }
    }
}

/// What a forecast run achieved.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary {
    pub n_train: usize,
    pub n_val:   usize,
    pub n_test:  usize,

    /// Training loss at the last logging step (standardized units)
    pub final_train_loss: f64,

    /// Logging epoch with the lowest validation loss, and that loss
    pub best_val_epoch: Option<usize>,
    pub best_val_loss:  Option<f64>,

    /// Test MSE in standardized units
    pub test_mse_standardized: Option<f64>,

    /// Test MSE in the physical units of w
    pub test_mse: Option<f64>,

    /// Share of test values where the predicted direction of motion
    /// (sign of w in physical units) matches the observed one
    pub test_accuracy: Option<f64>,
}

pub struct ForecastUseCase {
    config: ForecastConfig,
}

impl ForecastUseCase {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Run against the netCDF files under `data_dir`.
    pub fn execute(&self) -> Result<ForecastSummary> {
        let loader = Era5Loader::new(&self.config.data_dir, &self.config.period);
        self.execute_with(&loader)
    }

    /// Run against any profile source.
    pub fn execute_with(&self, source: &dyn ProfileSource) -> Result<ForecastSummary> {
        let cfg = &self.config;
        ensure!(
            (0.0..1.0).contains(&cfg.val_fraction),
            "validation fraction must be in [0, 1), got {}",
            cfg.val_fraction,
        );

        // ── Step 1: Load profiles ────────────────────────────────────────────
        let site = source.load_site(&cfg.site)?;

        // ── Step 2: Standardize ──────────────────────────────────────────────
        let t_std = Standardizer::fit(&site.temperature);
        let q_std = Standardizer::fit(&site.humidity);
        let w_std = Standardizer::fit(&site.vertical_velocity);
        let tz = t_std.apply(&site.temperature);
        let qz = q_std.apply(&site.humidity);
        let wz = w_std.apply(&site.vertical_velocity);

        // ── Step 3: Samples ──────────────────────────────────────────────────
        let samples = build_samples(&tz, &qz, &wz, cfg.sample_spec)?;
        tracing::info!("Built {} forecast samples", samples.len());

        // ── Step 4/5: Training, validation and test periods ──────────────────
        let (train_window, test) = split_chronological(samples, cfg.n_train);
        ensure!(!train_window.is_empty(), "no samples fall in the training window");

        let (train, val) = if cfg.val_fraction > 0.0 {
            split_train_val(train_window, 1.0 - cfg.val_fraction, cfg.fit.seed)
        } else {
            (train_window, Vec::new())
        };
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            train.len(),
            val.len(),
            test.len(),
        );
        let (n_train, n_val, n_test) = (train.len(), val.len(), test.len());

        // ── Step 6: Train ────────────────────────────────────────────────────
        let reports = ReportWriter::new(&cfg.output_dir)?;
        reports.write_run_config(cfg)?;
        let logger = MetricsLogger::new(&cfg.output_dir)?;

        let device = burn::backend::ndarray::NdArrayDevice::default();
        TrainBackend::seed(cfg.fit.seed);

        let input_size = cfg.sample_spec.feature_len(site.n_level());
        let model = AnnRegressorConfig::new(input_size, cfg.hidden_size, site.n_level())
            .init::<TrainBackend>(&device);
        tracing::info!(
            "Model ready: {} → {} → {}",
            input_size,
            cfg.hidden_size,
            site.n_level(),
        );

        let val = (!val.is_empty()).then(|| ProfileDataset::new(val));
        let outcome = fit::<TrainBackend, _>(
            model,
            ProfileDataset::new(train),
            val,
            &cfg.fit,
            &device,
            Some(&logger),
        )?;
        tracing::info!("Training metrics written to '{}'", logger.csv_path().display());
        let final_train_loss = outcome
            .history
            .last()
            .map_or(f64::NAN, |m| m.train_loss);

        let mut summary = ForecastSummary {
            n_train,
            n_val,
            n_test,
            final_train_loss,
            best_val_epoch:        outcome.best_val.as_ref().map(|m| m.epoch),
            best_val_loss:         outcome.best_val.as_ref().and_then(|m| m.val_loss),
            test_mse_standardized: None,
            test_mse:              None,
            test_accuracy:         None,
        };

        if test.is_empty() {
            tracing::warn!("No samples after the training window; skipping evaluation");
            return Ok(summary);
        }

        // ── Step 7: Predict the test period ──────────────────────────────────
        let model_valid = outcome.model.valid();
        let predicted_z = predict_rows::<EvalBackend, _>(&model_valid, &test, &device)?;

        let mut score_z = ScoreAccumulator::default();
        for (sample, pred) in test.iter().zip(&predicted_z) {
            score_z.add(pred, &sample.target);
        }

        // ── Step 8: Physical units and reports ───────────────────────────────
        let predicted: Vec<Vec<f32>> = predicted_z.iter().map(|r| w_std.invert_row(r)).collect();
        let observed:  Vec<Vec<f32>> = test
            .iter()
            .map(|s| site.vertical_velocity.row(s.time_index + 1).to_vec())
            .collect();
        let times: Vec<f64> = test.iter().map(|s| site.times[s.time_index + 1]).collect();

        let mut score = ScoreAccumulator::default();
        for (o, p) in observed.iter().zip(&predicted) {
            score.add(p, o);
        }

        reports.write_profile_bias(&site.pressures, &observed, &predicted)?;
        reports.write_forecast(&times, &site.pressures, &observed, &predicted, cfg.report_steps)?;

        summary.test_mse_standardized = Some(score_z.mse());
        summary.test_mse              = Some(score.mse());
        summary.test_accuracy         = Some(score.accuracy());

        tracing::info!(
            "Test period: mse={:.6e}, standardized mse={:.4}, accuracy={:.1}%",
            score.mse(),
            score_z.mse(),
            score.accuracy() * 100.0,
        );
        Ok(summary)
    }
}
