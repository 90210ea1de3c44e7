//! Classification decision tree (Gini splits)
//!
//! Building block for the ensemble trainer. Randomness (feature subsets per
//! split) comes from an RNG the caller threads in, so the fitted tree itself
//! stays plain serializable data.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fitted tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        class: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Decision tree classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth, unlimited if None
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Number of features considered per split, all if None
    pub max_features: Option<usize>,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Fit the tree. The RNG drives per-split feature subsampling only.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, rng: &mut ChaCha8Rng) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(PipelineError::Training("empty training data".to_string()));
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_node(x, y, &indices, 0, rng));
        Ok(())
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || counts.len() == 1
            || self.max_depth.map_or(false, |d| depth >= d);

        if should_stop {
            return TreeNode::Leaf {
                class: majority_class(&counts),
                n_samples,
            };
        }

        match self.find_best_split(x, y, indices, &counts, rng) {
            Some((feature_idx, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.min_samples_leaf
                    || right_indices.len() < self.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        class: majority_class(&counts),
                        n_samples,
                    };
                }

                let left = Box::new(self.build_node(x, y, &left_indices, depth + 1, rng));
                let right = Box::new(self.build_node(x, y, &right_indices, depth + 1, rng));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => TreeNode::Leaf {
                class: majority_class(&counts),
                n_samples,
            },
        }
    }

    /// Scan a (possibly subsampled) feature set for the split with the best
    /// Gini gain. Returns None when no split improves on the parent.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent_counts: &BTreeMap<i64, usize>,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let parent_impurity = gini(parent_counts, indices.len());

        let candidate_features: Vec<usize> = match self.max_features {
            Some(k) if k < self.n_features => {
                let mut chosen = sample(rng, self.n_features, k).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..self.n_features).collect(),
        };

        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = 0.0f64;

        for feature_idx in candidate_features {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let mut left_counts: BTreeMap<i64, usize> = BTreeMap::new();
                let mut left_total = 0usize;
                for &idx in indices {
                    if x[[idx, feature_idx]] <= threshold {
                        *left_counts.entry(y[idx].round() as i64).or_insert(0) += 1;
                        left_total += 1;
                    }
                }
                let right_total = indices.len() - left_total;

                if left_total < self.min_samples_leaf || right_total < self.min_samples_leaf {
                    continue;
                }

                let mut right_counts = parent_counts.clone();
                for (class, count) in &left_counts {
                    if let Some(c) = right_counts.get_mut(class) {
                        *c -= count;
                    }
                }

                let weighted = (left_total as f64 * gini(&left_counts, left_total)
                    + right_total as f64 * gini(&right_counts, right_total))
                    / n;

                let gain = parent_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold));
                }
            }
        }

        best
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| predict_sample(root, &x.row(i).to_vec()))
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Number of split levels on the longest root-to-leaf path. A lone leaf
    /// has depth 0, matching the `max_depth` cap semantics.
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { class, .. } => *class,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn class_counts(y: &Array1<f64>, indices: &[usize]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &idx in indices {
        *counts.entry(y[idx].round() as i64).or_insert(0) += 1;
    }
    counts
}

/// Majority class; ties resolve to the smallest class code for determinism.
fn majority_class(counts: &BTreeMap<i64, usize>) -> f64 {
    let mut best_class = 0i64;
    let mut best_count = 0usize;
    for (&class, &count) in counts {
        if count > best_count {
            best_count = count;
            best_class = class;
        }
    }
    best_class as f64
}

fn gini(counts: &BTreeMap<i64, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let sum_sq: f64 = counts.values().map(|&c| (c as f64 / n).powi(2)).sum();
    1.0 - sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_separable_classes() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng()).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_max_depth_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y, &mut rng()).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let x = array![
            [1.0, 9.0],
            [2.0, 8.0],
            [3.0, 7.0],
            [4.0, 6.0],
            [5.0, 5.0],
            [6.0, 4.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut a = DecisionTree::new().with_max_features(1);
        a.fit(&x, &y, &mut rng()).unwrap();
        let mut b = DecisionTree::new().with_max_features(1);
        b.fit(&x, &y, &mut rng()).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let tree = DecisionTree::new();
        let x = array![[1.0]];
        assert!(matches!(
            tree.predict(&x).unwrap_err(),
            PipelineError::ModelNotFitted
        ));
    }
}
