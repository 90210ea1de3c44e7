//! Dataset loading, schema validation, and feature/target splitting

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Read a headered CSV into a DataFrame, without schema validation.
///
/// Fails if the path does not exist or the file holds no data rows. Row and
/// column order of the file are preserved exactly.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        PipelineError::DataLoad(format!("cannot open {}: {}", path.display(), e))
    })?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| PipelineError::DataLoad(format!("{}: {}", path.display(), e)))?;

    if df.height() == 0 {
        return Err(PipelineError::DataLoad(format!(
            "{}: no data rows",
            path.display()
        )));
    }

    Ok(df)
}

/// Load a labeled tabular CSV and validate it against the pipeline's schema
/// expectations: the label column must exist and no cell may be null.
pub fn load_dataset(path: &Path, label_column: &str) -> Result<DataFrame> {
    let df = read_csv(path)?;

    if df.column(label_column).is_err() {
        return Err(PipelineError::DataLoad(format!(
            "{}: label column '{}' not found",
            path.display(),
            label_column
        )));
    }

    // No missing values tolerated anywhere in the table.
    for col in df.get_columns() {
        let nulls = col.null_count();
        if nulls > 0 {
            return Err(PipelineError::DataLoad(format!(
                "column '{}' has {} missing values",
                col.name(),
                nulls
            )));
        }
    }

    Ok(df)
}

/// Split a DataFrame into a numeric design matrix and a parallel label vector.
///
/// Pure with respect to the input: the label column is removed, every other
/// column must carry a numeric dtype. Row order is preserved.
pub fn split_columns(df: &DataFrame, label_column: &str) -> Result<(Array2<f64>, Vec<String>)> {
    let feature_cols: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != label_column)
        .map(|s| s.to_string())
        .collect();

    if feature_cols.is_empty() {
        return Err(PipelineError::Schema(
            "dataset has no feature columns".to_string(),
        ));
    }

    let n_rows = df.height();
    let n_cols = feature_cols.len();

    let col_data: Vec<Vec<f64>> = feature_cols
        .iter()
        .map(|name| {
            let col = df
                .column(name)
                .map_err(|e| PipelineError::Schema(e.to_string()))?;

            if !numeric_dtype(col.dtype()) {
                return Err(PipelineError::Schema(format!(
                    "feature column '{}' is not numeric (dtype {:?})",
                    name,
                    col.dtype()
                )));
            }

            if col.null_count() > 0 {
                return Err(PipelineError::Schema(format!(
                    "feature column '{}' has {} missing values",
                    name,
                    col.null_count()
                )));
            }

            let values: Vec<f64> = col
                .cast(&DataType::Float64)
                .map_err(|e| PipelineError::Schema(e.to_string()))?
                .f64()
                .map_err(|e| PipelineError::Schema(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    let x = Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]);

    let labels = label_values(df, label_column)?;

    Ok((x, labels))
}

fn numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

fn label_values(df: &DataFrame, label_column: &str) -> Result<Vec<String>> {
    let col = df
        .column(label_column)
        .map_err(|e| PipelineError::Schema(e.to_string()))?;

    if col.null_count() > 0 {
        return Err(PipelineError::Schema(format!(
            "label column '{}' has {} missing values",
            label_column,
            col.null_count()
        )));
    }

    let as_str = col
        .cast(&DataType::String)
        .map_err(|e| PipelineError::Schema(e.to_string()))?;

    let labels: Vec<String> = as_str
        .str()
        .map_err(|e| PipelineError::Schema(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();

    Ok(labels)
}

/// Bijection between class names and contiguous numeric codes.
///
/// Classes are sorted lexicographically, so the same label set always maps
/// to the same codes regardless of row order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEncoding {
    classes: Vec<String>,
}

impl ClassEncoding {
    /// Build the encoding from a label vector.
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Class names in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Encode labels to numeric codes. Fails on a label outside the fitted set.
    pub fn encode(&self, labels: &[String]) -> Result<Array1<f64>> {
        labels
            .iter()
            .map(|label| {
                self.classes
                    .binary_search(label)
                    .map(|idx| idx as f64)
                    .map_err(|_| PipelineError::Schema(format!("unknown class label '{}'", label)))
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    /// Decode numeric codes back to class names.
    pub fn decode(&self, codes: &Array1<f64>) -> Vec<String> {
        codes
            .iter()
            .map(|&code| {
                let idx = (code.round() as usize).min(self.classes.len().saturating_sub(1));
                self.classes[idx].clone()
            })
            .collect()
    }
}
