//! Run orchestration: load → split → partition → {train, evaluate, persist}*
//! → aggregate metrics

use crate::artifacts::{self, ModelManifest};
use crate::config::PipelineConfig;
use crate::dataset::{load_dataset, split_columns, ClassEncoding};
use crate::error::Result;
use crate::metrics::{evaluate, MetricsRecord};
use crate::models::default_classifiers;
use crate::split::stratified_partition;
use ndarray::Axis;
use tracing::{debug, info};

/// Outcome of one completed pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One record per trainer, in execution order
    pub metrics: Vec<MetricsRecord>,
    pub train_size: usize,
    pub test_size: usize,
    pub classes: Vec<String>,
}

/// The experiment pipeline.
///
/// Execution is strictly sequential and fail-fast: the first error aborts
/// the run, and the aggregate metrics file is written exactly once, after
/// every configured trainer has finished.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;

        info!(path = %cfg.data_path.display(), "loading dataset");
        let df = load_dataset(&cfg.data_path, &cfg.label_column)?;
        info!(rows = df.height(), cols = df.width(), "dataset loaded");

        let (x, labels) = split_columns(&df, &cfg.label_column)?;
        let encoding = ClassEncoding::fit(&labels);
        let y = encoding.encode(&labels)?;
        debug!(classes = ?encoding.classes(), "label encoding fitted");

        let partition = stratified_partition(&labels, cfg.test_fraction, cfg.seed)?;
        info!(
            train = partition.train_size(),
            test = partition.test_size(),
            seed = cfg.seed,
            "partition created"
        );

        let x_train = x.select(Axis(0), &partition.train_indices);
        let y_train = y.select(Axis(0), &partition.train_indices);
        let x_test = x.select(Axis(0), &partition.test_indices);
        let actual: Vec<String> = partition
            .test_indices
            .iter()
            .map(|&i| labels[i].clone())
            .collect();

        let mut all_metrics: Vec<MetricsRecord> = Vec::new();

        for mut classifier in default_classifiers(cfg.seed) {
            let name = classifier.name();
            info!(model = name, "training");
            classifier.fit(&x_train, &y_train)?;

            let predicted_codes = classifier.predict(&x_test)?;
            let predicted = encoding.decode(&predicted_codes);

            let record = evaluate(&actual, &predicted, name)?;
            info!(model = name, accuracy = record.accuracy, "evaluated");

            let snapshot = classifier.snapshot();
            let manifest =
                ModelManifest::new(name, snapshot.kind(), x.ncols(), encoding.classes());
            let model_path = cfg.model_dir.join(format!("{}.model", classifier.slug()));
            artifacts::save_model(&snapshot, &manifest, &model_path)?;
            debug!(model = name, path = %model_path.display(), "model saved");

            let predictions_path = cfg
                .predictions_dir
                .join(format!("{}_predictions.csv", classifier.slug()));
            artifacts::save_predictions(&actual, &predicted, name, &predictions_path)?;
            debug!(model = name, path = %predictions_path.display(), "predictions saved");

            all_metrics.push(record);
        }

        artifacts::save_metrics(&all_metrics, &cfg.metrics_path)?;
        info!(path = %cfg.metrics_path.display(), "metrics saved");

        Ok(RunSummary {
            metrics: all_metrics,
            train_size: partition.train_size(),
            test_size: partition.test_size(),
            classes: encoding.classes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_iris_like(dir: &TempDir, per_class: usize) -> std::path::PathBuf {
        let path = dir.path().join("data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "sepal_length,sepal_width,species").unwrap();
        for i in 0..per_class {
            let jitter = (i % 10) as f64 * 0.01;
            writeln!(file, "{:.2},{:.2},setosa", 1.0 + jitter, 1.1 + jitter).unwrap();
            writeln!(file, "{:.2},{:.2},versicolor", 4.0 + jitter, 4.1 + jitter).unwrap();
            writeln!(file, "{:.2},{:.2},virginica", 8.0 + jitter, 1.0 + jitter).unwrap();
        }
        path
    }

    fn test_config(dir: &TempDir, data: std::path::PathBuf) -> PipelineConfig {
        PipelineConfig::new(data)
            .with_model_dir(dir.path().join("models"))
            .with_predictions_dir(dir.path().join("predictions"))
            .with_metrics_path(dir.path().join("metrics.json"))
    }

    #[test]
    fn test_run_produces_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let data = write_iris_like(&dir, 20);
        let config = test_config(&dir, data);
        let summary = Pipeline::new(config.clone()).run().unwrap();

        assert_eq!(summary.metrics.len(), 2);
        assert_eq!(summary.train_size + summary.test_size, 60);
        assert_eq!(summary.classes, vec!["setosa", "versicolor", "virginica"]);

        assert!(config.model_dir.join("logistic_regression.model").exists());
        assert!(config.model_dir.join("random_forest.model").exists());
        assert!(config
            .predictions_dir
            .join("logistic_regression_predictions.csv")
            .exists());
        assert!(config
            .predictions_dir
            .join("random_forest_predictions.csv")
            .exists());
        assert!(config.metrics_path.exists());
    }

    #[test]
    fn test_run_fails_on_missing_data() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, dir.path().join("nope.csv"));
        let err = Pipeline::new(config).run().unwrap_err();
        assert!(matches!(err, PipelineError::DataLoad(_)));
    }

    #[test]
    fn test_failed_run_writes_no_metrics() {
        let dir = TempDir::new().unwrap();
        // One singleton class makes the partitioner fail after loading.
        let path = dir.path().join("data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b,species").unwrap();
        for i in 0..5 {
            writeln!(file, "{}.0,1.0,common", i).unwrap();
            writeln!(file, "{}.0,2.0,usual", i).unwrap();
        }
        writeln!(file, "9.0,9.0,singleton").unwrap();

        let config = test_config(&dir, path);
        let err = Pipeline::new(config.clone()).run().unwrap_err();
        assert!(matches!(err, PipelineError::Partition(_)));
        assert!(!config.metrics_path.exists());
    }
}
