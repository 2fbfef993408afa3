use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::loader::hour_of_day;
use crate::stats::{self, Statistic};

const MICROS_PER_MINUTE: f64 = 60.0 * 1_000_000.0;
const MICROS_PER_HOUR: f64 = 3600.0 * 1_000_000.0;

/// Derives ED wait times from the admission table.
///
/// Returns the admission table enriched with `ed_wait_time` (minutes),
/// `admission_duration` (hours) and `hour` (admittime hour-of-day), together
/// with the per-admission-type metrics table. Admissions without an ED
/// component keep a null wait time.
pub fn derive_wait_times(admissions: &DataFrame) -> Result<(DataFrame, DataFrame)> {
    let enriched = enrich_admissions(admissions)?;
    let metrics = wait_time_metrics(&enriched)?;
    info!(
        rows = enriched.height(),
        admission_types = metrics.height(),
        "derived ED wait times"
    );
    Ok((enriched, metrics))
}

fn enrich_admissions(admissions: &DataFrame) -> Result<DataFrame> {
    let len = admissions.height();
    let admittime = admissions.column("admittime")?.datetime()?;
    let dischtime = admissions.column("dischtime")?.datetime()?;
    let edregtime = admissions.column("edregtime")?.datetime()?;
    let edouttime = admissions.column("edouttime")?.datetime()?;

    let mut ed_wait = Vec::with_capacity(len);
    let mut duration = Vec::with_capacity(len);
    let mut hour = Vec::with_capacity(len);

    for idx in 0..len {
        ed_wait.push(match (edregtime.get(idx), edouttime.get(idx)) {
            (Some(registered), Some(departed)) => {
                Some((departed - registered) as f64 / MICROS_PER_MINUTE)
            }
            _ => None,
        });
        duration.push(match (admittime.get(idx), dischtime.get(idx)) {
            (Some(admitted), Some(discharged)) => {
                Some((discharged - admitted) as f64 / MICROS_PER_HOUR)
            }
            _ => None,
        });
        hour.push(admittime.get(idx).map(hour_of_day));
    }

    let mut enriched = admissions.clone();
    enriched.hstack_mut(&mut [
        Series::new("ed_wait_time".into(), ed_wait).into(),
        Series::new("admission_duration".into(), duration).into(),
        Series::new("hour".into(), hour).into(),
    ])?;
    Ok(enriched)
}

#[derive(Default)]
struct TypeAccumulator {
    wait_minutes: Vec<f64>,
    duration_hours: Vec<f64>,
}

fn wait_time_metrics(enriched: &DataFrame) -> Result<DataFrame> {
    let types = enriched.column("admission_type")?.str()?;
    let waits = enriched.column("ed_wait_time")?.f64()?;
    let durations = enriched.column("admission_duration")?.f64()?;

    let mut groups: BTreeMap<String, TypeAccumulator> = BTreeMap::new();
    for idx in 0..enriched.height() {
        // rows without an admission type have no grouping key
        let Some(admission_type) = types.get(idx) else {
            continue;
        };
        let acc = groups.entry(admission_type.to_string()).or_default();
        if let Some(minutes) = waits.get(idx) {
            acc.wait_minutes.push(minutes);
        }
        if let Some(hours) = durations.get(idx) {
            acc.duration_hours.push(hours);
        }
    }

    let mut labels: Vec<String> = Vec::with_capacity(groups.len());
    let mut wait_mean = Vec::with_capacity(groups.len());
    let mut wait_median = Vec::with_capacity(groups.len());
    let mut wait_count: Vec<u32> = Vec::with_capacity(groups.len());
    let mut duration_mean = Vec::with_capacity(groups.len());
    let mut duration_median = Vec::with_capacity(groups.len());

    for (admission_type, acc) in groups {
        labels.push(admission_type);
        wait_mean.push(stats::mean(&acc.wait_minutes).map(stats::round2));
        wait_median.push(stats::median(&acc.wait_minutes).map(stats::round2));
        wait_count.push(acc.wait_minutes.len() as u32);
        duration_mean.push(stats::mean(&acc.duration_hours).map(stats::round2));
        duration_median.push(stats::median(&acc.duration_hours).map(stats::round2));
    }

    let metrics = DataFrame::new(vec![
        Series::new("admission_type".into(), labels).into(),
        Series::new(stats::flat_name("ed_wait_time", Statistic::Mean).into(), wait_mean).into(),
        Series::new(
            stats::flat_name("ed_wait_time", Statistic::Median).into(),
            wait_median,
        )
        .into(),
        Series::new(
            stats::flat_name("ed_wait_time", Statistic::Count).into(),
            wait_count,
        )
        .into(),
        Series::new(
            stats::flat_name("admission_duration", Statistic::Mean).into(),
            duration_mean,
        )
        .into(),
        Series::new(
            stats::flat_name("admission_duration", Statistic::Median).into(),
            duration_median,
        )
        .into(),
    ])?;
    Ok(metrics)
}
