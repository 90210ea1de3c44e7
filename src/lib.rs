//! petalbench - deterministic classification experiment pipeline
//!
//! Turns a labeled tabular CSV into trained classifiers, quality metrics,
//! and persisted prediction logs, reproducibly for a fixed seed.
//!
//! # Modules
//!
//! - [`dataset`] - CSV loading, schema validation, feature/target splitting
//! - [`split`] - deterministic stratified train/test partitioning
//! - [`models`] - classifier trainers and the trainer registry
//! - [`metrics`] - accuracy and weighted precision/recall/f1
//! - [`artifacts`] - model blob, prediction CSV, and metrics JSON persistence
//! - [`pipeline`] - the orchestrator sequencing one full run
//! - [`cli`] - command-line interface

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod split;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunSummary};
