// ============================================================
// Layer 4 - Profile Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ProfileSample>
// into two float tensors:
//
//   inputs:  [batch_size, n_features]
//   targets: [batch_size, n_outputs]
//
// Every sample from one build_samples call has the same
// feature and target length, so rows are flattened in order
// and reshaped without any padding.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::ProfileSample;

#[derive(Debug, Clone)]
pub struct ProfileBatch<B: Backend> {
    /// Predictors - shape: [batch_size, n_features]
    pub inputs: Tensor<B, 2>,

    /// Next-step profiles - shape: [batch_size, n_outputs]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct ProfileBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ProfileBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack equal-length rows into a [rows, width] tensor.
pub fn rows_to_tensor<B: Backend>(
    rows:   &[&[f32]],
    device: &B::Device,
) -> Tensor<B, 2> {
    let n_rows = rows.len();
    let width  = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Tensor::<B, 2>::from_data(TensorData::new(flat, [n_rows, width]), device)
}

impl<B: Backend> Batcher<ProfileSample, ProfileBatch<B>> for ProfileBatcher<B> {
    fn batch(&self, items: Vec<ProfileSample>) -> ProfileBatch<B> {
        let features: Vec<&[f32]> = items.iter().map(|s| s.features.as_slice()).collect();
        let targets:  Vec<&[f32]> = items.iter().map(|s| s.target.as_slice()).collect();

        ProfileBatch {
            inputs:  rows_to_tensor::<B>(&features, &self.device),
            targets: rows_to_tensor::<B>(&targets, &self.device),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_order() {
        let device  = Default::default();
        let batcher = ProfileBatcher::<NdArray>::new(device);
        let items = vec![
            ProfileSample { features: vec![1.0, 2.0, 3.0], target: vec![10.0, 20.0], time_index: 0 },
            ProfileSample { features: vec![4.0, 5.0, 6.0], target: vec![30.0, 40.0], time_index: 1 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(),  [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 2]);

        let inputs = batch.inputs.into_data().to_vec::<f32>().unwrap();
        assert_eq!(inputs, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
