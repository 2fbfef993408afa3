use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::loader::hour_of_day;
use crate::stats::{self, Statistic};

const MICROS_PER_HOUR: f64 = 3600.0 * 1_000_000.0;

const ICU_CONTEXT_COLUMNS: [&str; 5] = [
    "subject_id",
    "hadm_id",
    "icustay_id",
    "first_careunit",
    "last_careunit",
];

/// Derives ward patient-flow from the transfer and ICU-stay tables.
///
/// Every transfer row is kept: transfers without matching ICU context carry
/// null `first_careunit`/`last_careunit`. Returns the enriched transfer table
/// (with `length_of_stay` in hours and `hour` from intime) and the
/// per-ward metrics table.
pub fn derive_transfer_flow(
    transfers: &DataFrame,
    icustays: &DataFrame,
) -> Result<(DataFrame, DataFrame)> {
    let enriched = enrich_transfers(transfers, icustays)?;
    let metrics = ward_metrics(&enriched)?;
    info!(
        rows = enriched.height(),
        wards = metrics.height(),
        "derived ward transfer flow"
    );
    Ok((enriched, metrics))
}

fn enrich_transfers(transfers: &DataFrame, icustays: &DataFrame) -> Result<DataFrame> {
    let context = icustays.select(ICU_CONTEXT_COLUMNS)?;
    let mut enriched = transfers
        .clone()
        .lazy()
        .join(
            context.lazy(),
            [col("subject_id"), col("hadm_id"), col("icustay_id")],
            [col("subject_id"), col("hadm_id"), col("icustay_id")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    let len = enriched.height();
    let intime = enriched.column("intime")?.datetime()?;
    let outtime = enriched.column("outtime")?.datetime()?;

    let mut stay_hours = Vec::with_capacity(len);
    let mut hour = Vec::with_capacity(len);
    for idx in 0..len {
        stay_hours.push(match (intime.get(idx), outtime.get(idx)) {
            (Some(entered), Some(left)) => Some((left - entered) as f64 / MICROS_PER_HOUR),
            _ => None,
        });
        hour.push(intime.get(idx).map(hour_of_day));
    }

    enriched.hstack_mut(&mut [
        Series::new("length_of_stay".into(), stay_hours).into(),
        Series::new("hour".into(), hour).into(),
    ])?;
    Ok(enriched)
}

#[derive(Default)]
struct WardAccumulator {
    patients: u32,
    stay_hours: Vec<f64>,
}

fn ward_metrics(enriched: &DataFrame) -> Result<DataFrame> {
    let wards = enriched.column("curr_wardid")?.cast(&DataType::String)?;
    let wards = wards.str()?;
    let subjects = enriched.column("subject_id")?.i64()?;
    let stays = enriched.column("length_of_stay")?.f64()?;

    let mut groups: BTreeMap<String, WardAccumulator> = BTreeMap::new();
    for idx in 0..enriched.height() {
        let Some(ward) = wards.get(idx) else {
            continue;
        };
        let acc = groups.entry(ward.to_string()).or_default();
        if subjects.get(idx).is_some() {
            acc.patients += 1;
        }
        if let Some(hours) = stays.get(idx) {
            acc.stay_hours.push(hours);
        }
    }

    // numeric coercion happens after grouping; wards that fail it drop out of
    // the metrics entirely
    let mut rows: Vec<(f64, WardAccumulator)> = groups
        .into_iter()
        .filter_map(|(ward, acc)| {
            let id = ward.trim().parse::<f64>().ok()?;
            id.is_finite().then_some((id, acc))
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ward_ids = Vec::with_capacity(rows.len());
    let mut patient_counts: Vec<u32> = Vec::with_capacity(rows.len());
    let mut stay_mean = Vec::with_capacity(rows.len());
    let mut stay_median = Vec::with_capacity(rows.len());
    let mut stay_std = Vec::with_capacity(rows.len());

    for (ward, acc) in rows {
        ward_ids.push(ward);
        patient_counts.push(acc.patients);
        stay_mean.push(stats::mean(&acc.stay_hours).map(stats::round2));
        stay_median.push(stats::median(&acc.stay_hours).map(stats::round2));
        stay_std.push(stats::sample_std(&acc.stay_hours).map(stats::round2));
    }

    let metrics = DataFrame::new(vec![
        Series::new("curr_wardid".into(), ward_ids).into(),
        Series::new(
            stats::flat_name("subject_id", Statistic::Count).into(),
            patient_counts,
        )
        .into(),
        Series::new(
            stats::flat_name("length_of_stay", Statistic::Mean).into(),
            stay_mean,
        )
        .into(),
        Series::new(
            stats::flat_name("length_of_stay", Statistic::Median).into(),
            stay_median,
        )
        .into(),
        Series::new(
            stats::flat_name("length_of_stay", Statistic::Std).into(),
            stay_std,
        )
        .into(),
    ])?;
    Ok(metrics)
}
