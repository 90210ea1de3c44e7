//! Pipeline configuration

use std::path::PathBuf;

/// Configuration for one pipeline run.
///
/// The seed is passed explicitly to every stochastic stage (partitioner,
/// trainers), so determinism does not depend on call order.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the input CSV
    pub data_path: PathBuf,
    /// Name of the label column
    pub label_column: String,
    /// Fraction of rows held out for testing, must be in (0, 1)
    pub test_fraction: f64,
    /// Seed for the partitioner and all trainers
    pub seed: u64,
    /// Directory for serialized model artifacts
    pub model_dir: PathBuf,
    /// Directory for per-model prediction CSVs
    pub predictions_dir: PathBuf,
    /// Path of the aggregate metrics JSON
    pub metrics_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/iris.csv"),
            label_column: "species".to_string(),
            test_fraction: 0.2,
            seed: 42,
            model_dir: PathBuf::from("models"),
            predictions_dir: PathBuf::from("predictions"),
            metrics_path: PathBuf::from("metrics.json"),
        }
    }
}

impl PipelineConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    pub fn with_label_column(mut self, label: impl Into<String>) -> Self {
        self.label_column = label.into();
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_predictions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.predictions_dir = dir.into();
        self
    }

    pub fn with_metrics_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.label_column, "species");
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.data_path, PathBuf::from("data/iris.csv"));
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::new("table.csv")
            .with_label_column("target")
            .with_test_fraction(0.3)
            .with_seed(7);
        assert_eq!(config.label_column, "target");
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.seed, 7);
    }
}
