//! Integration test: full pipeline end-to-end (load → partition → train →
//! evaluate → persist)

use petalbench::artifacts::load_model;
use petalbench::config::PipelineConfig;
use petalbench::dataset::{load_dataset, split_columns, ClassEncoding};
use petalbench::metrics::MetricsRecord;
use petalbench::pipeline::Pipeline;
use petalbench::split::stratified_partition;
use ndarray::Axis;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a 150-row, 3-class balanced dataset (50/50/50) shaped like iris.
fn write_dataset(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("iris.csv");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "sepal_length,sepal_width,petal_length,petal_width,species").unwrap();

    for i in 0..50 {
        let j = (i % 10) as f64 * 0.03;
        writeln!(file, "{:.2},{:.2},{:.2},{:.2},setosa", 5.0 + j, 3.4 + j, 1.4 + j, 0.2 + j)
            .unwrap();
    }
    for i in 0..50 {
        let j = (i % 10) as f64 * 0.03;
        writeln!(file, "{:.2},{:.2},{:.2},{:.2},versicolor", 5.9 + j, 2.8 + j, 4.3 + j, 1.3 + j)
            .unwrap();
    }
    for i in 0..50 {
        let j = (i % 10) as f64 * 0.03;
        writeln!(file, "{:.2},{:.2},{:.2},{:.2},virginica", 6.6 + j, 3.0 + j, 5.5 + j, 2.0 + j)
            .unwrap();
    }

    path
}

fn config_in(dir: &TempDir, data: PathBuf, subdir: &str) -> PipelineConfig {
    PipelineConfig::new(data)
        .with_model_dir(dir.path().join(subdir).join("models"))
        .with_predictions_dir(dir.path().join(subdir).join("predictions"))
        .with_metrics_path(dir.path().join(subdir).join("metrics.json"))
}

#[test]
fn test_run_produces_expected_partition_and_artifacts() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let config = config_in(&dir, data, "run");
    let summary = Pipeline::new(config.clone()).run().unwrap();

    // 150 rows, fraction 0.2 => 30 test / 120 train.
    assert_eq!(summary.test_size, 30);
    assert_eq!(summary.train_size, 120);
    assert_eq!(summary.metrics.len(), 2);
    assert_eq!(summary.metrics[0].model, "Logistic Regression");
    assert_eq!(summary.metrics[1].model, "Random Forest");

    for record in &summary.metrics {
        for value in [record.accuracy, record.precision, record.recall, record.f1_score] {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    // Well-separated classes: both models should do well.
    assert!(summary.metrics[1].accuracy > 0.8);

    assert!(config.model_dir.join("logistic_regression.model").exists());
    assert!(config.model_dir.join("random_forest.model").exists());

    // Each predictions file has header + one row per test sample.
    for slug in ["logistic_regression", "random_forest"] {
        let path = config
            .predictions_dir
            .join(format!("{}_predictions.csv", slug));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 31, "{} row count", slug);
        assert_eq!(content.lines().next().unwrap(), "actual,predicted,model");
    }
}

#[test]
fn test_metrics_file_is_ordered_and_complete() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let config = config_in(&dir, data, "metrics");
    Pipeline::new(config.clone()).run().unwrap();

    let parsed: Vec<MetricsRecord> =
        serde_json::from_str(&fs::read_to_string(&config.metrics_path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].model, "Logistic Regression");
    assert_eq!(parsed[1].model, "Random Forest");
}

#[test]
fn test_reruns_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let first = config_in(&dir, data.clone(), "a");
    let second = config_in(&dir, data, "b");
    Pipeline::new(first.clone()).run().unwrap();
    Pipeline::new(second.clone()).run().unwrap();

    for slug in ["logistic_regression", "random_forest"] {
        let name = format!("{}_predictions.csv", slug);
        let bytes_a = fs::read(first.predictions_dir.join(&name)).unwrap();
        let bytes_b = fs::read(second.predictions_dir.join(&name)).unwrap();
        assert_eq!(bytes_a, bytes_b, "{} differs between runs", name);
    }

    let metrics_a: Vec<MetricsRecord> =
        serde_json::from_str(&fs::read_to_string(&first.metrics_path).unwrap()).unwrap();
    let metrics_b: Vec<MetricsRecord> =
        serde_json::from_str(&fs::read_to_string(&second.metrics_path).unwrap()).unwrap();
    for (a, b) in metrics_a.iter().zip(metrics_b.iter()) {
        assert_eq!(a.model, b.model);
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.f1_score, b.f1_score);
    }
}

#[test]
fn test_different_seed_changes_partition() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let base = config_in(&dir, data.clone(), "s42").with_seed(42);
    let other = config_in(&dir, data, "s7").with_seed(7);
    Pipeline::new(base.clone()).run().unwrap();
    Pipeline::new(other.clone()).run().unwrap();

    let a = fs::read(base.predictions_dir.join("random_forest_predictions.csv")).unwrap();
    let b = fs::read(other.predictions_dir.join("random_forest_predictions.csv")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_persisted_model_predicts_like_in_memory() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let config = config_in(&dir, data.clone(), "roundtrip");
    Pipeline::new(config.clone()).run().unwrap();

    // Rebuild the exact test partition the run used.
    let df = load_dataset(&data, "species").unwrap();
    let (x, labels) = split_columns(&df, "species").unwrap();
    let encoding = ClassEncoding::fit(&labels);
    let partition = stratified_partition(&labels, config.test_fraction, config.seed).unwrap();
    let x_test = x.select(Axis(0), &partition.test_indices);

    for slug in ["logistic_regression", "random_forest"] {
        let (manifest, model) =
            load_model(&config.model_dir.join(format!("{}.model", slug))).unwrap();
        assert_eq!(manifest.n_features, 4);
        assert_eq!(manifest.classes, encoding.classes());

        let codes = model.predict(&x_test).unwrap();
        let decoded = encoding.decode(&codes);

        // The persisted predictions file is the in-memory model's output;
        // the reloaded model must reproduce it exactly.
        let content = fs::read_to_string(
            config
                .predictions_dir
                .join(format!("{}_predictions.csv", slug)),
        )
        .unwrap();
        let recorded: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(decoded, recorded, "{} round-trip mismatch", slug);
    }
}

#[test]
fn test_aborts_on_nonexistent_data() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, dir.path().join("missing.csv"), "fail");
    let result = Pipeline::new(config.clone()).run();
    assert!(result.is_err());
    assert!(!config.metrics_path.exists());
}

#[test]
fn test_aborts_on_bad_fraction() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);
    let config = config_in(&dir, data, "badfrac").with_test_fraction(1.5);
    assert!(Pipeline::new(config).run().is_err());
}
