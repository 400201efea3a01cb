// ============================================================
// Layer 2 - AutoencodeUseCase
// ============================================================
// Trains the autoencoder to reproduce its own input
// (target = input) and writes the bottleneck codes.
//
// Two data sources:
//   synthetic - n_samples x input_size standard-normal rows
//               drawn after seeding the backend
//   era5      - standardized profiles of one variable of a
//               site, one row per time step; input size is the
//               number of pressure levels

use anyhow::{anyhow, ensure, Result};
use burn::{module::AutodiffModule, prelude::*, tensor::Distribution};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::rows_to_tensor,
    dataset::{ProfileDataset, ProfileSample},
    loader::{Era5Loader, DEFAULT_PERIOD},
    preprocessor::Standardizer,
};
use crate::domain::traits::ProfileSource;
use crate::infra::{
    metrics::{mean_squared_error, sign_agreement, MetricsLogger},
    report::ReportWriter,
};
use crate::ml::{
    model::AutoencoderConfig,
    predictor::predict_rows,
    trainer::{fit, tensor_values, FitConfig},
    EvalBackend, TrainBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoencodeSource {
    Synthetic,
    Era5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoencodeConfig {
    pub source:      AutoencodeSource,
    pub output_dir:  String,
    pub latent_size: usize,
    pub hidden_size: usize,

    // synthetic source
    pub n_samples:   usize,
    pub input_size:  usize,

    // era5 source
    pub data_dir:    String,
    pub site:        String,
    pub period:      String,
    pub variable:    String,
    /// Leading time steps used (0 = all)
    pub n_train:     usize,

    pub fit:         FitConfig,
}

impl Default for AutoencodeConfig {
    fn default() -> Self {
        Self {
            source:      AutoencodeSource::Synthetic,
            output_dir:  "runs/autoencode".to_string(),
            latent_size: 3,
            hidden_size: 5,
            n_samples:   10,
            input_size:  8,
            data_dir:    ".".to_string(),
            site:        "BNF".to_string(),
            period:      DEFAULT_PERIOD.to_string(),
            variable:    "w".to_string(),
            n_train:     10_000,
            fit:         FitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoencodeSummary {
    pub n_samples:  usize,
    pub input_dim:  usize,
    pub latent_dim: usize,

    /// Training loss at the last logging step
    pub final_train_loss: f64,

    /// Reconstruction MSE of the trained model over every sample
    pub reconstruction_mse: f64,

    /// Share of reconstructed values with the sign of the input
    pub reconstruction_accuracy: f64,
}

pub struct AutoencodeUseCase {
    config: AutoencodeConfig,
}

impl AutoencodeUseCase {
    pub fn new(config: AutoencodeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<AutoencodeSummary> {
        let loader = Era5Loader::new(&self.config.data_dir, &self.config.period);
        self.execute_with(&loader)
    }

    pub fn execute_with(&self, source: &dyn ProfileSource) -> Result<AutoencodeSummary> {
        let cfg    = &self.config;
        let device = burn::backend::ndarray::NdArrayDevice::default();

        ensure!(cfg.latent_size > 0, "latent size must be positive");

        // ── Input rows ───────────────────────────────────────────────────────
        let rows = match cfg.source {
            AutoencodeSource::Synthetic => self.synthetic_rows(&device)?,
            AutoencodeSource::Era5      => self.profile_rows(source)?,
        };
        ensure!(!rows.is_empty(), "no rows to train the autoencoder on");
        let input_dim = rows[0].len();

        let samples: Vec<ProfileSample> = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| ProfileSample { features: row.clone(), target: row, time_index: i })
            .collect();

        // ── Train ────────────────────────────────────────────────────────────
        let reports = ReportWriter::new(&cfg.output_dir)?;
        reports.write_run_config(cfg)?;
        let logger = MetricsLogger::new(&cfg.output_dir)?;

        TrainBackend::seed(cfg.fit.seed);
        let model = AutoencoderConfig::new(input_dim, cfg.latent_size)
            .with_hidden_dim(cfg.hidden_size)
            .init::<TrainBackend>(&device);
        tracing::info!(
            "Autoencoder ready: {} → {} → {} → {} → {}",
            input_dim, cfg.hidden_size, cfg.latent_size, cfg.hidden_size, input_dim,
        );

        let outcome = fit::<TrainBackend, _>(
            model,
            ProfileDataset::new(samples.clone()),
            None,
            &cfg.fit,
            &device,
            Some(&logger),
        )?;

        // ── Reconstruction and latent codes ──────────────────────────────────
        let model_valid = outcome.model.valid();
        let reconstructed = predict_rows::<EvalBackend, _>(&model_valid, &samples, &device)?;
        let reconstructed: Vec<f32> = reconstructed.concat();
        let targets: Vec<f32> = samples.iter().flat_map(|s| s.target.iter().copied()).collect();

        let inputs: Vec<&[f32]> = samples.iter().map(|s| s.features.as_slice()).collect();
        let latent = model_valid.encode(rows_to_tensor::<EvalBackend>(&inputs, &device));
        let latent_rows: Vec<Vec<f32>> = tensor_values(latent)?
            .chunks(cfg.latent_size)
            .map(|r| r.to_vec())
            .collect();
        reports.write_latent(&latent_rows)?;

        let summary = AutoencodeSummary {
            n_samples:               samples.len(),
            input_dim,
            latent_dim:              cfg.latent_size,
            final_train_loss:        outcome.history.last().map_or(f64::NAN, |m| m.train_loss),
            reconstruction_mse:      mean_squared_error(&reconstructed, &targets),
            reconstruction_accuracy: sign_agreement(&reconstructed, &targets),
        };
        tracing::info!(
            "Reconstruction mse={:.4}, sign agreement={:.1}%",
            summary.reconstruction_mse,
            summary.reconstruction_accuracy * 100.0,
        );
        Ok(summary)
    }

    fn synthetic_rows(&self, device: &<EvalBackend as Backend>::Device) -> Result<Vec<Vec<f32>>> {
        let cfg = &self.config;
        ensure!(cfg.n_samples > 0 && cfg.input_size > 0, "synthetic data needs samples and features");

        EvalBackend::seed(cfg.fit.seed);
        let x = Tensor::<EvalBackend, 2>::random(
            [cfg.n_samples, cfg.input_size],
            Distribution::Normal(0.0, 1.0),
            device,
        );
        let values = tensor_values(x)?;
        Ok(values.chunks(cfg.input_size).map(|r| r.to_vec()).collect())
    }

    fn profile_rows(&self, source: &dyn ProfileSource) -> Result<Vec<Vec<f32>>> {
        let cfg  = &self.config;
        let site = source.load_site(&cfg.site)?;
        let series = site
            .series(&cfg.variable)
            .ok_or_else(|| anyhow!("unknown variable '{}' (expected t, q or w)", cfg.variable))?;

        let standardized = Standardizer::fit(series).apply(series);
        let limit = if cfg.n_train == 0 { usize::MAX } else { cfg.n_train };
        Ok(standardized.rows().take(limit).map(|r| r.to_vec()).collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::write_site;

    fn fast_fit() -> FitConfig {
        FitConfig { epochs: 30, lr: 0.01, batch_size: 64, log_every: 10, seed: 42 }
    }

    #[test]
    fn test_synthetic_autoencoder() {
        let out = tempfile::tempdir().unwrap();
        let cfg = AutoencodeConfig {
            output_dir: out.path().to_str().unwrap().to_string(),
            fit:        fast_fit(),
            ..AutoencodeConfig::default()
        };

        let summary = AutoencodeUseCase::new(cfg).execute().unwrap();
        assert_eq!(summary.n_samples,  10);
        assert_eq!(summary.input_dim,  8);
        assert_eq!(summary.latent_dim, 3);
        assert!(summary.reconstruction_mse.is_finite());
        assert!((0.0..=1.0).contains(&summary.reconstruction_accuracy));

        let latent = std::fs::read_to_string(out.path().join("latent.csv")).unwrap();
        assert_eq!(latent.lines().count(), 11);
    }

    #[test]
    fn test_era5_profiles_autoencoder() {
        let data = tempfile::tempdir().unwrap();
        let out  = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(data.path(), DEFAULT_PERIOD);
        write_site(&loader, "BNF", 20);

        let cfg = AutoencodeConfig {
            source:      AutoencodeSource::Era5,
            data_dir:    data.path().to_str().unwrap().to_string(),
            output_dir:  out.path().to_str().unwrap().to_string(),
            latent_size: 2,
            n_train:     15,
            fit:         fast_fit(),
            ..AutoencodeConfig::default()
        };

        let summary = AutoencodeUseCase::new(cfg).execute().unwrap();
        assert_eq!(summary.n_samples, 15);
        assert_eq!(summary.input_dim, 3);
    }

    #[test]
    fn test_unknown_variable() {
        let data = tempfile::tempdir().unwrap();
        let out  = tempfile::tempdir().unwrap();
        let loader = Era5Loader::new(data.path(), DEFAULT_PERIOD);
        write_site(&loader, "BNF", 5);

        let cfg = AutoencodeConfig {
            source:     AutoencodeSource::Era5,
            variable:   "u".to_string(),
            output_dir: out.path().to_str().unwrap().to_string(),
            ..AutoencodeConfig::default()
        };
        assert!(AutoencodeUseCase::new(cfg).execute_with(&loader).is_err());
    }
}
