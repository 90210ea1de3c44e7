//! Classification metric computation

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quality metrics for one model on one test partition.
///
/// Precision, recall, and f1 are per-class values combined by each class's
/// frequency in the ground truth (weighted averaging), so the numbers track
/// the true label distribution regardless of how many classes exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub model: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Compute accuracy and weighted precision/recall/f1 from parallel label
/// vectors.
///
/// The two vectors must have equal length. A class present in `actual` but
/// never predicted contributes zero precision rather than an error;
/// predicted-only classes carry no weight. All outputs are clamped to [0, 1].
pub fn evaluate(
    actual: &[String],
    predicted: &[String],
    model_name: &str,
) -> Result<MetricsRecord> {
    if actual.len() != predicted.len() {
        return Err(PipelineError::Shape {
            expected: format!("{} predictions", actual.len()),
            actual: format!("{} predictions", predicted.len()),
        });
    }

    let n = actual.len() as f64;
    let correct = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a == p)
        .count() as f64;
    let accuracy = if n > 0.0 { correct / n } else { 0.0 };

    let mut support: BTreeMap<&str, usize> = BTreeMap::new();
    for label in actual {
        *support.entry(label.as_str()).or_insert(0) += 1;
    }

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;

    for (&class, &count) in &support {
        let weight = count as f64 / n;

        let tp = actual
            .iter()
            .zip(predicted.iter())
            .filter(|(a, p)| a.as_str() == class && p.as_str() == class)
            .count() as f64;
        let predicted_as = predicted.iter().filter(|p| p.as_str() == class).count() as f64;

        let class_precision = if predicted_as > 0.0 { tp / predicted_as } else { 0.0 };
        let class_recall = tp / count as f64;
        let class_f1 = if class_precision + class_recall > 0.0 {
            2.0 * class_precision * class_recall / (class_precision + class_recall)
        } else {
            0.0
        };

        precision += weight * class_precision;
        recall += weight * class_recall;
        f1 += weight * class_f1;
    }

    Ok(MetricsRecord {
        model: model_name.to_string(),
        accuracy: accuracy.clamp(0.0, 1.0),
        precision: precision.clamp(0.0, 1.0),
        recall: recall.clamp(0.0, 1.0),
        f1_score: f1.clamp(0.0, 1.0),
    })
}
