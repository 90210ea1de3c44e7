//! Artifact persistence: model blobs, prediction logs, metrics documents

use crate::error::{PipelineError, Result};
use crate::metrics::MetricsRecord;
use crate::models::TrainedClassifier;
use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Magic bytes at the head of every model artifact.
const MODEL_MAGIC: &[u8; 4] = b"PTLB";
/// Bumped whenever the artifact layout changes.
const MODEL_FORMAT_VERSION: u16 = 1;

/// Metadata header stored alongside a serialized model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Human-readable model name
    pub name: String,
    /// Snapshot variant tag
    pub kind: String,
    /// Training timestamp (UTC, RFC 3339)
    pub trained_at: String,
    /// Feature count the model was fitted on
    pub n_features: usize,
    /// Class names in code order
    pub classes: Vec<String>,
}

impl ModelManifest {
    pub fn new(name: &str, kind: &str, n_features: usize, classes: &[String]) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            trained_at: Utc::now().to_rfc3339(),
            n_features,
            classes: classes.to_vec(),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::Persist(format!("{}: {}", parent.display(), e)))?;
        }
    }
    Ok(())
}

/// Write a fitted model to an explicit, versioned binary artifact.
///
/// Layout: magic, format version (u16 LE), manifest length (u32 LE),
/// manifest JSON, bincode payload.
pub fn save_model(
    snapshot: &TrainedClassifier,
    manifest: &ModelManifest,
    path: &Path,
) -> Result<()> {
    ensure_parent_dir(path)?;

    let manifest_json = serde_json::to_vec(manifest)?;
    let payload = snapshot.to_bytes()?;

    let mut file = File::create(path)
        .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))?;

    let write = |file: &mut File, bytes: &[u8]| -> Result<()> {
        file.write_all(bytes)
            .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))
    };

    write(&mut file, MODEL_MAGIC)?;
    write(&mut file, &MODEL_FORMAT_VERSION.to_le_bytes())?;
    write(&mut file, &(manifest_json.len() as u32).to_le_bytes())?;
    write(&mut file, &manifest_json)?;
    write(&mut file, &payload)?;

    Ok(())
}

/// Read a model artifact back, validating magic and format version.
pub fn load_model(path: &Path) -> Result<(ModelManifest, TrainedClassifier)> {
    let mut file = File::open(path)
        .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))?;

    if bytes.len() < 10 || &bytes[..4] != MODEL_MAGIC {
        return Err(PipelineError::Persist(format!(
            "{}: not a model artifact",
            path.display()
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != MODEL_FORMAT_VERSION {
        return Err(PipelineError::Persist(format!(
            "{}: unsupported artifact format version {}",
            path.display(),
            version
        )));
    }

    let manifest_len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let manifest_end = 10 + manifest_len;
    if bytes.len() < manifest_end {
        return Err(PipelineError::Persist(format!(
            "{}: truncated artifact",
            path.display()
        )));
    }

    let manifest: ModelManifest = serde_json::from_slice(&bytes[10..manifest_end])?;
    let snapshot = TrainedClassifier::from_bytes(&bytes[manifest_end..])?;

    Ok((manifest, snapshot))
}

/// Write one model's prediction log: columns `actual, predicted, model`,
/// one row per test sample.
pub fn save_predictions(
    actual: &[String],
    predicted: &[String],
    model_name: &str,
    path: &Path,
) -> Result<()> {
    ensure_parent_dir(path)?;

    let model_col = vec![model_name.to_string(); actual.len()];
    let mut df = df!(
        "actual" => actual,
        "predicted" => predicted,
        "model" => &model_col,
    )
    .map_err(|e| PipelineError::Persist(e.to_string()))?;

    let mut file = File::create(path)
        .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|e| PipelineError::Persist(e.to_string()))?;

    Ok(())
}

/// Write the run's complete ordered metrics collection as one JSON document.
///
/// The document lands under a temporary name first and is renamed into
/// place, so a prior run's file is either fully replaced or left intact.
pub fn save_metrics(records: &[MetricsRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;

    let json = serde_json::to_string_pretty(records)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| PipelineError::Persist(format!("{}: {}", tmp_path.display(), e)))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| PipelineError::Persist(format!("{}: {}", path.display(), e)))?;

    Ok(())
}
