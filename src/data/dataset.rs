// ============================================================
// Layer 4 - Forecast Samples
// ============================================================
// Turns standardized grids into (features, target) pairs for
// the one-step forecast  x(t-n+1 .. t) -> w(t+1).
//
// With history = 2 and include_w = false, sample i is:
//
//   features = [ t_z(i) | q_z(i) | t_z(i-1) | q_z(i-1) ]
//   target   =   w_z(i+1)
//
// Most recent state comes first so the leading block always
// lines up with the single-step layout.

use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::profile::ProfileSeries;

/// One training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSample {
    pub features: Vec<f32>,
    pub target:   Vec<f32>,

    /// Time index of the most recent input state; the target
    /// belongs to `time_index + 1`
    pub time_index: usize,
}

/// How predictors are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSpec {
    /// Number of consecutive time steps fed to the model (>= 1)
    pub history: usize,

    /// Also feed the standardized vertical velocity itself
    pub include_w: bool,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self { history: 1, include_w: false }
    }
}

impl SampleSpec {
    /// Length of the feature vector for grids with `n_level` levels.
    pub fn feature_len(&self, n_level: usize) -> usize {
        let blocks = if self.include_w { 3 } else { 2 };
        self.history * blocks * n_level
    }
}

/// Build one sample per time step that has a full history and a successor.
pub fn build_samples(
    t:    &ProfileSeries,
    q:    &ProfileSeries,
    w:    &ProfileSeries,
    spec: SampleSpec,
) -> Result<Vec<ProfileSample>> {
    ensure!(spec.history >= 1, "history window must be at least 1 step");
    ensure!(
        t.n_time == q.n_time && q.n_time == w.n_time,
        "t, q and w must share the time axis ({} / {} / {})",
        t.n_time, q.n_time, w.n_time,
    );

    let n_time = w.n_time;
    if n_time < spec.history + 1 {
        tracing::warn!(
            "Only {} time steps, need at least {} for one sample",
            n_time,
            spec.history + 1
        );
        return Ok(Vec::new());
    }

    let feature_len = spec.feature_len(t.n_level);
    let samples: Vec<ProfileSample> = (spec.history - 1..n_time - 1)
        .map(|i| {
            let mut features = Vec::with_capacity(feature_len);
            for k in 0..spec.history {
                let step = i - k;
                features.extend_from_slice(t.row(step));
                features.extend_from_slice(q.row(step));
                if spec.include_w {
                    features.extend_from_slice(w.row(step));
                }
            }
            ProfileSample {
                features,
                target: w.row(i + 1).to_vec(),
                time_index: i,
            }
        })
        .collect();

    tracing::debug!(
        "Built {} samples with {} features each",
        samples.len(),
        feature_len
    );
    Ok(samples)
}

pub struct ProfileDataset {
    samples: Vec<ProfileSample>,
}

impl ProfileDataset {
    pub fn new(samples: Vec<ProfileSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ProfileSample> for ProfileDataset {
    fn get(&self, index: usize) -> Option<ProfileSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
