use polars::prelude::*;
use tracing::info;

use crate::error::Result;

/// Buckets enriched admissions and transfers by hour-of-day.
///
/// Expects the `hour` column appended by the enrichment stages. Returns the
/// (hour, admission_type) and (hour, curr_wardid) count tables.
pub fn derive_hourly_stats(
    admissions: &DataFrame,
    transfers: &DataFrame,
) -> Result<(DataFrame, DataFrame)> {
    let hourly_admissions = count_by(admissions, "admission_type", "admission_count")?;
    let hourly_transfers = count_by(transfers, "curr_wardid", "transfer_count")?;
    info!(
        admission_buckets = hourly_admissions.height(),
        transfer_buckets = hourly_transfers.height(),
        "derived hourly patterns"
    );
    Ok((hourly_admissions, hourly_transfers))
}

fn count_by(df: &DataFrame, category: &str, count_name: &str) -> Result<DataFrame> {
    let counts = df
        .clone()
        .lazy()
        // a row without a concrete (hour, category) key belongs to no bucket
        .filter(col("hour").is_not_null().and(col(category).is_not_null()))
        .group_by([col("hour"), col(category)])
        .agg([len().alias(count_name)])
        .sort(["hour", category], SortMultipleOptions::default())
        .collect()?;
    Ok(counts)
}
