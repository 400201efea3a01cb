// ============================================================
// Layer 5 - Batch Prediction
// ============================================================
// Runs a trained model over held-out samples and hands the
// outputs back as plain rows, one per sample, still in the
// standardized space the model was trained in.

use anyhow::Result;
use burn::prelude::*;

use crate::data::{batcher::rows_to_tensor, dataset::ProfileSample};
use crate::ml::{model::Predictor, trainer::tensor_values};

/// Rows pushed through the model per forward pass
const PREDICT_CHUNK: usize = 4096;

pub fn predict_rows<B, M>(
    model:   &M,
    samples: &[ProfileSample],
    device:  &B::Device,
) -> Result<Vec<Vec<f32>>>
where
    B: Backend,
    M: Predictor<B>,
{
    let mut out = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(PREDICT_CHUNK) {
        let rows: Vec<&[f32]> = chunk.iter().map(|s| s.features.as_slice()).collect();
        let pred  = model.predict(rows_to_tensor::<B>(&rows, device));
        let width = pred.dims()[1];
        let flat  = tensor_values(pred)?;
        out.extend(flat.chunks(width.max(1)).map(|r| r.to_vec()));
    }

    tracing::debug!("Predicted {} rows", out.len());
    Ok(out)
}
