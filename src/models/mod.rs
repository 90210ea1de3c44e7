//! Classifier trainers
//!
//! Every trainer implements the [`Classifier`] capability (fit, predict,
//! snapshot) and is deterministic given its seed and a fixed input order.
//! [`default_classifiers`] is the registry the orchestrator iterates over;
//! adding a model family means adding a variant here, not touching the
//! pipeline.

mod forest;
mod linear;
mod tree;

pub use forest::ForestClassifier;
pub use linear::LinearClassifier;
pub use tree::{DecisionTree, TreeNode};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Capability interface for a trainable classifier.
pub trait Classifier: Send + Sync {
    /// Human-readable model name, used in metrics and prediction records.
    fn name(&self) -> &'static str;

    /// File-stem form of the name, used for artifact paths.
    fn slug(&self) -> &'static str;

    /// Fit on a design matrix and encoded label vector.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict encoded labels for new rows.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Clone the fitted state into its persistable form.
    fn snapshot(&self) -> TrainedClassifier;
}

/// Serializable snapshot of a fitted classifier.
///
/// This is what the artifact store writes; after deserialization it predicts
/// identically to the in-memory model it was taken from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedClassifier {
    Linear(LinearClassifier),
    Forest(ForestClassifier),
}

impl TrainedClassifier {
    pub fn kind(&self) -> &'static str {
        match self {
            TrainedClassifier::Linear(_) => "linear",
            TrainedClassifier::Forest(_) => "forest",
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedClassifier::Linear(model) => model.predict(x),
            TrainedClassifier::Forest(model) => model.predict(x),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PipelineError::Persist(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| PipelineError::Persist(e.to_string()))
    }
}

/// The configured trainer lineup, in execution order.
pub fn default_classifiers(seed: u64) -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(LinearClassifier::new().with_max_iter(200).with_seed(seed)),
        Box::new(ForestClassifier::new(100).with_seed(seed)),
    ]
}

/// Reject empty or single-class training data before any trainer runs.
pub(crate) fn check_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 || y.is_empty() {
        return Err(PipelineError::Training(
            "train partition is empty".to_string(),
        ));
    }

    if x.nrows() != y.len() {
        return Err(PipelineError::Shape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }

    let first = y[0];
    if y.iter().all(|&v| v == first) {
        return Err(PipelineError::Training(
            "train partition contains a single class; fit would be degenerate".to_string(),
        ));
    }

    Ok(())
}

/// Sorted, deduplicated class codes present in a label vector.
pub(crate) fn unique_classes(y: &Array1<f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = y.iter().copied().collect();
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    classes.dedup();
    classes
}
