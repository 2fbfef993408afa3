use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Batch pipeline turning raw hospital-admission extracts into the
/// analysis-ready tables the dashboard and wait-time predictor consume.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the raw CSV extracts (ADMISSIONS.csv, TRANSFERS.csv, ...)
    #[arg(long, default_value = "data/raw")]
    data_dir: PathBuf,

    /// Directory the processed tables are written to
    #[arg(long, default_value = "data/processed")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let bundle = wardflow_core::run_pipeline(&cli.data_dir)
        .context("processing pipeline failed")?;
    let written = wardflow_core::outputs::write_bundle(&bundle, &cli.output_dir)
        .context("failed to write output bundle")?;

    info!(tables = written.len(), path = %cli.output_dir.display(), "run finished");
    Ok(())
}
