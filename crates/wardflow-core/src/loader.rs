use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::{error, info};

use crate::error::{PipelineError, Result};

pub const ADMISSIONS_FILE: &str = "ADMISSIONS.csv";
pub const TRANSFERS_FILE: &str = "TRANSFERS.csv";
pub const PATIENTS_FILE: &str = "PATIENTS.csv";
pub const ICUSTAYS_FILE: &str = "ICUSTAYS.csv";
pub const SERVICES_FILE: &str = "SERVICES.csv";

const ADMISSION_DATETIME_COLUMNS: &[&str] = &["admittime", "dischtime", "edregtime", "edouttime"];
const TRANSFER_DATETIME_COLUMNS: &[&str] = &["intime", "outtime"];
const ICUSTAY_DATETIME_COLUMNS: &[&str] = &["intime", "outtime"];
const SERVICE_DATETIME_COLUMNS: &[&str] = &["transfertime"];

/// The five raw extracts, datetime columns already parsed.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub admissions: DataFrame,
    pub transfers: DataFrame,
    pub patients: DataFrame,
    pub icustays: DataFrame,
    pub services: DataFrame,
}

/// Loads the five raw CSV extracts from `data_dir`. A missing file or a
/// missing designated datetime column is fatal; an unparsable datetime value
/// becomes null.
pub fn load_tables(data_dir: &Path) -> Result<RawTables> {
    info!(path = %data_dir.display(), "loading raw admission extracts");

    let admissions = load_table(data_dir, ADMISSIONS_FILE, ADMISSION_DATETIME_COLUMNS)?;
    let transfers = load_table(data_dir, TRANSFERS_FILE, TRANSFER_DATETIME_COLUMNS)?;
    let patients = load_table(data_dir, PATIENTS_FILE, &[])?;
    let icustays = load_table(data_dir, ICUSTAYS_FILE, ICUSTAY_DATETIME_COLUMNS)?;
    let services = load_table(data_dir, SERVICES_FILE, SERVICE_DATETIME_COLUMNS)?;

    Ok(RawTables {
        admissions,
        transfers,
        patients,
        icustays,
        services,
    })
}

fn load_table(
    data_dir: &Path,
    file_name: &'static str,
    datetime_columns: &[&str],
) -> Result<DataFrame> {
    read_table(data_dir, file_name, datetime_columns).map_err(|err| {
        error!(table = file_name, error = %err, "failed to load table");
        err
    })
}

fn read_table(
    data_dir: &Path,
    file_name: &'static str,
    datetime_columns: &[&str],
) -> Result<DataFrame> {
    let path = data_dir.join(file_name);
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path))
        .map_err(|source| PipelineError::Load {
            table: file_name,
            source,
        })?
        .finish()
        .map_err(|source| PipelineError::Load {
            table: file_name,
            source,
        })?;

    for column in datetime_columns {
        parse_datetime_column(file_name, &mut df, column)?;
    }

    Ok(df)
}

fn parse_datetime_column(table: &'static str, df: &mut DataFrame, name: &str) -> Result<()> {
    let raw = df.column(name).map_err(|_| PipelineError::MissingColumn {
        table,
        column: name.to_string(),
    })?;

    let utf8 = raw.cast(&DataType::String)?;
    let parsed: Vec<Option<i64>> = utf8
        .str()?
        .into_iter()
        .map(|value| value.and_then(parse_timestamp_micros))
        .collect();

    let series = Series::new(name.into(), parsed)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    df.replace(name, series)?;
    Ok(())
}

pub(crate) fn parse_timestamp_micros(value: &str) -> Option<i64> {
    static FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    None
}

/// Hour of day (0-23) of a microsecond datetime value.
pub(crate) fn hour_of_day(micros: i64) -> i64 {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| i64::from(dt.hour()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_parse_across_iso_variants() {
        assert!(parse_timestamp_micros("2023-01-01 08:00:00").is_some());
        assert!(parse_timestamp_micros("2023-01-01T08:00:00.250").is_some());
        assert!(parse_timestamp_micros("2023-01-01T08:00").is_some());
        assert!(parse_timestamp_micros("not a timestamp").is_none());
        assert!(parse_timestamp_micros("").is_none());
    }

    #[test]
    fn hour_extraction_uses_clock_hour() {
        let micros = parse_timestamp_micros("2023-01-01 23:59:59").unwrap();
        assert_eq!(hour_of_day(micros), 23);
        let micros = parse_timestamp_micros("2023-01-02 00:00:00").unwrap();
        assert_eq!(hour_of_day(micros), 0);
    }
}
