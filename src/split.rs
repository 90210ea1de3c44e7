//! Deterministic stratified train/test partitioning

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A train/test partition over row indices.
///
/// The two index sets are disjoint and exhaustive; both are kept sorted
/// ascending so downstream artifacts preserve dataset row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl Partition {
    pub fn train_size(&self) -> usize {
        self.train_indices.len()
    }

    pub fn test_size(&self) -> usize {
        self.test_indices.len()
    }
}

/// Stratified split: per class, `round(test_fraction × class_count)` rows go
/// to the test set, drawn by a seeded shuffle. The count is clamped so every
/// class keeps at least one row on each side.
///
/// Classes are visited in sorted label order and a single `ChaCha8Rng` seeded
/// from `seed` drives all shuffles, so identical inputs always produce
/// identical partitions.
pub fn stratified_partition(
    labels: &[String],
    test_fraction: f64,
    seed: u64,
) -> Result<Partition> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::Partition(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    // BTreeMap keeps class iteration order stable.
    let mut class_indices: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        class_indices.entry(label.as_str()).or_default().push(idx);
    }

    for (class, indices) in &class_indices {
        if indices.len() < 2 {
            return Err(PipelineError::Partition(format!(
                "class '{}' has {} member(s); need at least 2 to represent it in both subsets",
                class,
                indices.len()
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for indices in class_indices.values() {
        let count = indices.len();
        let n_test = (test_fraction * count as f64).round() as usize;
        let n_test = n_test.clamp(1, count - 1);

        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);

        test_indices.extend_from_slice(&shuffled[..n_test]);
        train_indices.extend_from_slice(&shuffled[n_test..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(Partition {
        train_indices,
        test_indices,
    })
}
