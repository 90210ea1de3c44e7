//! Random forest classifier

use super::tree::DecisionTree;
use super::{check_training_data, unique_classes, Classifier, TrainedClassifier};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bagged ensemble of randomized Gini trees with majority voting.
///
/// Each tree gets its own `ChaCha8Rng` seeded from `seed + tree index`, so
/// the fitted forest is identical across runs and independent of the order
/// in which trees are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    trees: Vec<DecisionTree>,
    /// Ensemble size
    pub n_estimators: usize,
    /// Depth cap applied to every tree, unlimited if None
    pub max_depth: Option<usize>,
    /// Base seed for bootstrap sampling and feature subsets
    pub seed: u64,
    classes: Vec<f64>,
    n_features: usize,
}

impl Default for ForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            seed: 42,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestClassifier {
    fn name(&self) -> &'static str {
        "Random Forest"
    }

    fn slug(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_data(x, y)?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.classes = unique_classes(y);

        let max_features = ((self.n_features as f64).sqrt().ceil() as usize).max(1);
        let base_seed = self.seed;
        let max_depth = self.max_depth;

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                // Bootstrap sample with replacement
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new().with_max_features(max_features);
                if let Some(depth) = max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit(&x_boot, &y_boot, &mut rng)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_samples = x.nrows();
        let predictions: Vec<f64> = (0..n_samples)
            .map(|i| {
                // Majority vote; ties resolve to the smallest class code.
                let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
                for preds in &all_predictions {
                    *votes.entry(preds[i].round() as i64).or_insert(0) += 1;
                }
                let mut best_class = 0i64;
                let mut best_count = 0usize;
                for (&class, &count) in &votes {
                    if count > best_count {
                        best_count = count;
                        best_class = class;
                    }
                }
                best_class as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn snapshot(&self) -> TrainedClassifier {
        TrainedClassifier::Forest(self.clone())
    }
}
