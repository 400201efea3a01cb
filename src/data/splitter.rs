// ============================================================
// Layer 4 - Train/Test and Train/Validation Splitters
// ============================================================
// Two ways of dividing samples:
//
//   split_chronological - the first n_train samples are the
//     training period, everything after it is the held-out
//     test period. Time order is kept, so the model is always
//     evaluated on data that comes after what it learned from.
//
//   split_train_val - seeded Fisher-Yates shuffle, then split.
//     Used inside the training period to carve out a
//     validation set that is checked during training.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Split at `n_train` without reordering. `n_train` larger than the
/// input puts everything in the training set.
pub fn split_chronological<T>(mut samples: Vec<T>, n_train: usize) -> (Vec<T>, Vec<T>) {
    let split_at = n_train.min(samples.len());
    let test     = samples.split_off(split_at);

    tracing::debug!(
        "Chronological split: {} training, {} test",
        samples.len(),
        test.len(),
    );

    (samples, test)
}

/// Shuffle `samples` with a seeded RNG and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - RNG seed; the same seed gives the same split
pub fn split_train_val<T>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}
