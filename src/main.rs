//! petalbench - main entry point

use clap::Parser;
use petalbench::cli::{cmd_info, cmd_run, Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petalbench=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => cmd_run(args)?,
        Some(Commands::Info { data }) => cmd_info(&data)?,
        // Default: run the pipeline with the stock configuration.
        None => cmd_run(RunArgs::parse_from(["petalbench"]))?,
    }

    Ok(())
}
