use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{error, info};

use crate::error::Result;
use crate::{hourly_stats, loader, transfer_flow, wait_times};

/// The full set of derived tables from one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedBundle {
    pub admissions: DataFrame,
    pub transfers: DataFrame,
    pub hourly_admissions: DataFrame,
    pub hourly_transfers: DataFrame,
    pub wait_time_metrics: DataFrame,
    pub ward_metrics: DataFrame,
}

/// Runs the batch transform end to end: load, wait times, transfer flow,
/// hourly patterns. A failing stage aborts the run; no partial bundle is
/// produced.
pub fn run_pipeline(data_dir: &Path) -> Result<ProcessedBundle> {
    let tables = stage("load", loader::load_tables(data_dir))?;

    let (admissions, wait_time_metrics) = stage(
        "wait_times",
        wait_times::derive_wait_times(&tables.admissions),
    )?;

    let (transfers, ward_metrics) = stage(
        "transfer_flow",
        transfer_flow::derive_transfer_flow(&tables.transfers, &tables.icustays),
    )?;

    let (hourly_admissions, hourly_transfers) = stage(
        "hourly_stats",
        hourly_stats::derive_hourly_stats(&admissions, &transfers),
    )?;

    info!(
        admissions = admissions.height(),
        transfers = transfers.height(),
        "pipeline run complete"
    );

    Ok(ProcessedBundle {
        admissions,
        transfers,
        hourly_admissions,
        hourly_transfers,
        wait_time_metrics,
        ward_metrics,
    })
}

/// Attaches stage context to failures via the log, then propagates the error
/// unmodified.
fn stage<T>(name: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|err| {
        error!(stage = name, error = %err, "pipeline stage failed");
        err
    })
}
