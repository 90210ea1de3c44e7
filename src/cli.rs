//! Command-line interface

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::dataset::read_csv;
use crate::pipeline::Pipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(50)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "petalbench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic train/evaluate/persist pipeline for tabular classification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: partition, train all models, evaluate, persist
    Run(RunArgs),

    /// Show dataset information without training
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Parser)]
pub struct RunArgs {
    /// Input data file (CSV with header)
    #[arg(short, long, default_value = "data/iris.csv")]
    pub data: PathBuf,

    /// Label column name
    #[arg(short, long, default_value = "species")]
    pub label_column: String,

    /// Fraction of rows held out for testing, in (0, 1)
    #[arg(short, long, default_value = "0.2")]
    pub test_fraction: f64,

    /// Seed for the partitioner and all trainers
    #[arg(short, long, default_value = "42")]
    pub seed: u64,

    /// Output directory for model artifacts
    #[arg(long, default_value = "models")]
    pub model_dir: PathBuf,

    /// Output directory for prediction CSVs
    #[arg(long, default_value = "predictions")]
    pub predictions_dir: PathBuf,

    /// Output path for the aggregate metrics JSON
    #[arg(long, default_value = "metrics.json")]
    pub metrics_path: PathBuf,
}

impl From<RunArgs> for PipelineConfig {
    fn from(args: RunArgs) -> Self {
        PipelineConfig::new(args.data)
            .with_label_column(args.label_column)
            .with_test_fraction(args.test_fraction)
            .with_seed(args.seed)
            .with_model_dir(args.model_dir)
            .with_predictions_dir(args.predictions_dir)
            .with_metrics_path(args.metrics_path)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config: PipelineConfig = args.into();

    section("Run");
    println!("  {:<14} {}", muted("Data"), config.data_path.display());
    println!("  {:<14} {}", muted("Test fraction"), config.test_fraction);
    println!("  {:<14} {}", muted("Seed"), config.seed);

    let start = Instant::now();
    let summary = Pipeline::new(config).run()?;

    section("Results");
    println!(
        "  {:<24} {:>10} {:>10} {:>10} {:>10}",
        muted("Model"),
        muted("Accuracy"),
        muted("Precision"),
        muted("Recall"),
        muted("F1")
    );
    println!("  {}", dim(&"─".repeat(68)));
    for record in &summary.metrics {
        println!(
            "  {:<24} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            record.model, record.accuracy, record.precision, record.recall, record.f1_score
        );
    }

    println!();
    println!(
        "  {} {} {}",
        ok("✓"),
        "run completed".white(),
        dim(&format!(
            "({} train / {} test rows, {:.2?})",
            summary.train_size,
            summary.test_size,
            start.elapsed()
        ))
    );
    println!();

    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    // Label validation is a run concern; here any column layout is fine.
    let df = read_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!(
        "  {:<20} {:<12} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(42)));
    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()),
            col.as_materialized_series().n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}
