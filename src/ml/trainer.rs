// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fixed-epoch MSE minimisation with Burn's DataLoader and Adam.
//
//   for epoch in 1..=epochs:
//       for batch in loader:
//           pred  = model.predict(inputs)
//           loss  = mse(pred, targets)
//           grads = loss.backward()
//           model = adam.step(lr, model, grads)
//       every log_every epochs: report loss / accuracy
//
// Targets are standardized, so the reported accuracy is the
// sign agreement of anomalies from the per-level mean.
//
// With the default batch size the whole training window is a
// single batch, so one epoch is one optimizer step.
//
// The model is generic over the Predictor trait: the same loop
// fits the forecast regressor (targets = next-step w) and the
// autoencoder (targets = inputs).

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::ProfileBatcher, dataset::ProfileDataset};
use crate::infra::metrics::{EpochMetrics, MetricsLogger, ScoreAccumulator};
use crate::ml::model::Predictor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    pub epochs:     usize,
    pub lr:         f64,
    pub batch_size: usize,
    pub log_every:  usize,
    pub seed:       u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs:     1000,
            lr:         0.01,
            batch_size: 10_000,
            log_every:  10,
            seed:       42,
        }
    }
}

pub struct FitOutcome<M> {
    pub model:   M,
    /// One entry per logging step
    pub history: Vec<EpochMetrics>,
    /// Logging step with the lowest validation loss
    pub best_val: Option<EpochMetrics>,
}

pub fn fit<B, M>(
    mut model: M,
    train:     ProfileDataset,
    val:       Option<ProfileDataset>,
    cfg:       &FitConfig,
    device:    &B::Device,
    logger:    Option<&MetricsLogger>,
) -> Result<FitOutcome<M>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Predictor<B>,
    M::InnerModule: Predictor<B::InnerBackend>,
{
    ensure!(cfg.epochs > 0, "epochs must be positive");
    ensure!(cfg.batch_size > 0, "batch size must be positive");
    ensure!(cfg.log_every > 0, "log interval must be positive");
    ensure!(train.sample_count() > 0, "training set is empty");

    let n_train = train.sample_count();
    let val = val.filter(|v| v.sample_count() > 0);

    // ── Adam with torch defaults (β1 = 0.9, β2 = 0.999, ε = 1e-8) ─────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, M>();

    let train_loader = DataLoaderBuilder::new(ProfileBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train);

    let val_loader = val.map(|v| {
        DataLoaderBuilder::new(ProfileBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .build(v)
    });

    let mse = MseLoss::new();
    let mut history  = Vec::new();
    let mut best_val: Option<EpochMetrics> = None;

    tracing::info!(
        "Training on {} samples for {} epochs (lr={}, batch_size={})",
        n_train, cfg.epochs, cfg.lr, cfg.batch_size,
    );

    for epoch in 1..=cfg.epochs {
        let report = epoch % cfg.log_every == 0 || epoch == cfg.epochs;

        let mut loss_sum = 0.0f64;
        let mut rows     = 0usize;
        let mut score    = ScoreAccumulator::default();

        for batch in train_loader.iter() {
            let n    = batch.inputs.dims()[0];
            let pred = model.predict(batch.inputs);

            if report {
                score.add(&tensor_values(pred.clone())?, &tensor_values(batch.targets.clone())?);
            }

            let loss = mse.forward(pred, batch.targets, Reduction::Mean);
            loss_sum += loss.clone().into_scalar().elem::<f64>() * n as f64;
            rows     += n;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        if !report {
            continue;
        }

        let train_loss = if rows > 0 { loss_sum / rows as f64 } else { f64::NAN };

        // ── Validation on the inner backend (no autodiff graph) ──────────────
        let val_loss = match &val_loader {
            Some(loader) => {
                let model_valid = model.valid();
                let mut val_score = ScoreAccumulator::default();
                for batch in loader.iter() {
                    let pred = model_valid.predict(batch.inputs);
                    val_score.add(&tensor_values(pred)?, &tensor_values(batch.targets)?);
                }
                Some(val_score.mse())
            }
            None => None,
        };

        let metrics = EpochMetrics::new(epoch, train_loss, val_loss, score.accuracy());
        tracing::debug!("Epoch {} scored {} predicted values", epoch, score.count());
        let best_loss = best_val.as_ref().and_then(|b| b.val_loss).unwrap_or(f64::INFINITY);
        if metrics.is_improvement(best_loss) {
            tracing::debug!("New best validation loss at epoch {}", epoch);
            best_val = Some(metrics.clone());
        }
        match metrics.val_loss {
            Some(v) => println!(
                "Epoch [{}/{}], Loss: {:.4}, Val Loss: {:.4}, Accuracy: {:.1}%",
                epoch, cfg.epochs, train_loss, v, metrics.accuracy * 100.0,
            ),
            None => println!(
                "Epoch [{}/{}], Loss: {:.4}, Accuracy: {:.1}%",
                epoch, cfg.epochs, train_loss, metrics.accuracy * 100.0,
            ),
        }

        if let Some(logger) = logger {
            logger.log(&metrics)?;
        }
        history.push(metrics);
    }

    if let Some(best) = &best_val {
        tracing::info!(
            "Best validation loss {:.4} at epoch {}",
            best.val_loss.unwrap_or(f64::NAN),
            best.epoch,
        );
    }
    tracing::info!("Training complete!");
    Ok(FitOutcome { model, history, best_val })
}

/// Copy a float tensor back to the host, row-major.
pub fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor values: {e:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::dataset::ProfileSample;
    use crate::ml::model::{AnnRegressorConfig, AutoencoderConfig};

    type TB = Autodiff<NdArray>;

    /// target = [x0 - x1, 0.5 * x1] on a small deterministic grid
    fn linear_samples(n: usize) -> Vec<ProfileSample> {
        (0..n)
            .map(|i| {
                let x0 = ((i * 7) % 11) as f32 / 5.0 - 1.0;
                let x1 = ((i * 3) % 7) as f32 / 3.0 - 1.0;
                ProfileSample {
                    features:   vec![x0, x1],
                    target:     vec![x0 - x1, 0.5 * x1],
                    time_index: i,
                }
            })
            .collect()
    }

    #[test]
    fn test_regressor_loss_decreases() {
        let device = Default::default();
        TB::seed(42);
        let model = AnnRegressorConfig::new(2, 16, 2).init::<TB>(&device);
        let cfg   = FitConfig { epochs: 200, lr: 0.01, batch_size: 64, log_every: 10, seed: 42 };

        let outcome = fit::<TB, _>(
            model,
            ProfileDataset::new(linear_samples(40)),
            Some(ProfileDataset::new(linear_samples(10))),
            &cfg,
            &device,
            None,
        ).unwrap();

        assert_eq!(outcome.history.len(), 20);
        let first = outcome.history.first().unwrap();
        let last  = outcome.history.last().unwrap();
        assert!(last.train_loss < first.train_loss, "{} !< {}", last.train_loss, first.train_loss);
        assert!(last.val_loss.is_some());

        let best = outcome.best_val.unwrap();
        let lowest = outcome
            .history
            .iter()
            .filter_map(|m| m.val_loss)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(best.val_loss, Some(lowest));
    }

    #[test]
    fn test_autoencoder_reconstruction_improves() {
        let device = Default::default();
        TB::seed(42);
        let model = AutoencoderConfig::new(4, 2).init::<TB>(&device);
        let samples: Vec<ProfileSample> = linear_samples(20)
            .into_iter()
            .map(|s| {
                let x = vec![s.features[0], s.features[1], s.target[0], s.target[1]];
                ProfileSample { features: x.clone(), target: x, time_index: s.time_index }
            })
            .collect();
        let cfg = FitConfig { epochs: 100, lr: 0.01, batch_size: 20, log_every: 50, seed: 1 };

        let outcome = fit::<TB, _>(model, ProfileDataset::new(samples), None, &cfg, &device, None).unwrap();
        assert_eq!(outcome.history.len(), 2);
        assert!(outcome.history[1].train_loss < outcome.history[0].train_loss);
        assert!(outcome.history[1].val_loss.is_none());
        assert!(outcome.best_val.is_none());
    }

    #[test]
    fn test_final_epoch_is_always_logged() {
        let device = Default::default();
        let model  = AnnRegressorConfig::new(2, 4, 2).init::<TB>(&device);
        let cfg    = FitConfig { epochs: 15, lr: 0.01, batch_size: 8, log_every: 10, seed: 3 };
        let outcome = fit::<TB, _>(model, ProfileDataset::new(linear_samples(8)), None, &cfg, &device, None).unwrap();
        let epochs: Vec<usize> = outcome.history.iter().map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![10, 15]);
    }

    #[test]
    fn test_rejects_empty_training_set() {
        let device = Default::default();
        let model  = AnnRegressorConfig::new(2, 4, 2).init::<TB>(&device);
        let result = fit::<TB, _>(model, ProfileDataset::new(Vec::new()), None, &FitConfig::default(), &device, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_settings() {
        let device = Default::default();
        let zeroed = [
            FitConfig { epochs: 0, ..FitConfig::default() },
            FitConfig { batch_size: 0, ..FitConfig::default() },
            FitConfig { log_every: 0, ..FitConfig::default() },
        ];
        for cfg in zeroed {
            let model  = AnnRegressorConfig::new(2, 4, 2).init::<TB>(&device);
            let result = fit::<TB, _>(model, ProfileDataset::new(linear_samples(8)), None, &cfg, &device, None);
            assert!(result.is_err(), "accepted {cfg:?}");
        }
    }
}
