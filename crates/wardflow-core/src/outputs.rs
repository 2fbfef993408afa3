use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::pipeline::ProcessedBundle;

pub const ADMISSIONS_OUT: &str = "admissions.csv";
pub const TRANSFERS_OUT: &str = "transfers.csv";
pub const HOURLY_ADMISSIONS_OUT: &str = "hourly_stats_admissions.csv";
pub const HOURLY_TRANSFERS_OUT: &str = "hourly_stats_transfers.csv";
pub const WAIT_TIME_METRICS_OUT: &str = "metrics_wait_times.csv";
pub const WARD_METRICS_OUT: &str = "metrics_ward_metrics.csv";

// datetime rendering the loader can parse back
const OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Writes every table of the bundle as a headered CSV file under
/// `output_dir`, creating the directory if needed and overwriting any
/// previous run. Returns the written paths.
pub fn write_bundle(bundle: &ProcessedBundle, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let tables: [(&str, &DataFrame); 6] = [
        (ADMISSIONS_OUT, &bundle.admissions),
        (TRANSFERS_OUT, &bundle.transfers),
        (HOURLY_ADMISSIONS_OUT, &bundle.hourly_admissions),
        (HOURLY_TRANSFERS_OUT, &bundle.hourly_transfers),
        (WAIT_TIME_METRICS_OUT, &bundle.wait_time_metrics),
        (WARD_METRICS_OUT, &bundle.ward_metrics),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (file_name, df) in tables {
        let path = output_dir.join(file_name);
        write_table(df, &path)?;
        info!(path = %path.display(), rows = df.height(), "saved output table");
        written.push(path);
    }
    Ok(written)
}

fn write_table(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(OUTPUT_DATETIME_FORMAT.to_string()))
        .finish(&mut out)?;
    Ok(())
}
