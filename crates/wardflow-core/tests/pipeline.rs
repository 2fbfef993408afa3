use std::fs;
use std::path::Path;

use polars::prelude::*;
use tempfile::tempdir;

use wardflow_core::{loader, outputs, run_pipeline, PipelineError};

fn write_raw_fixtures(dir: &Path) {
    fs::write(
        dir.join("ADMISSIONS.csv"),
        "subject_id,hadm_id,admission_type,admittime,dischtime,edregtime,edouttime,admission_location,ethnicity\n\
         1,100,EMERGENCY,2023-01-01 08:00:00,2023-01-01 20:00:00,2023-01-01 06:00:00,2023-01-01 07:30:00,EMERGENCY ROOM ADMIT,WHITE\n\
         2,101,ELECTIVE,2023-01-02 09:00:00,2023-01-03 09:00:00,,,PHYS REFERRAL,ASIAN\n\
         3,102,EMERGENCY,2023-01-02 22:15:00,2023-01-04 10:15:00,2023-01-02 20:00:00,2023-01-02 21:30:00,EMERGENCY ROOM ADMIT,BLACK\n",
    )
    .unwrap();

    fs::write(
        dir.join("TRANSFERS.csv"),
        "subject_id,hadm_id,icustay_id,curr_wardid,intime,outtime\n\
         1,100,1000,52,2023-01-01 08:00:00,2023-01-01 18:00:00\n\
         2,101,,14,2023-01-02 09:30:00,2023-01-02 15:30:00\n\
         3,102,,not-a-ward,2023-01-02 23:00:00,2023-01-03 05:00:00\n",
    )
    .unwrap();

    fs::write(
        dir.join("PATIENTS.csv"),
        "subject_id,gender,dob\n1,F,2050-01-01\n2,M,2049-05-20\n3,F,2051-07-04\n",
    )
    .unwrap();

    fs::write(
        dir.join("ICUSTAYS.csv"),
        "subject_id,hadm_id,icustay_id,first_careunit,last_careunit,intime,outtime\n\
         1,100,1000,MICU,SICU,2023-01-01 08:30:00,2023-01-01 17:00:00\n",
    )
    .unwrap();

    fs::write(
        dir.join("SERVICES.csv"),
        "subject_id,hadm_id,transfertime,curr_service\n1,100,2023-01-01 08:10:00,MED\n",
    )
    .unwrap();
}

#[test]
fn pipeline_produces_expected_bundle() -> PolarsResult<()> {
    let raw = tempdir().unwrap();
    write_raw_fixtures(raw.path());

    let bundle = run_pipeline(raw.path()).unwrap();

    assert_eq!(bundle.admissions.height(), 3);
    let wait = bundle.admissions.column("ed_wait_time")?.f64()?;
    let hour = bundle.admissions.column("hour")?.i64()?;
    assert_eq!(wait.get(0), Some(90.0));
    assert_eq!(wait.get(1), None);
    assert_eq!(hour.get(2), Some(22));

    assert_eq!(bundle.transfers.height(), 3);
    let first_careunit = bundle.transfers.column("first_careunit")?.str()?;
    assert_eq!(first_careunit.get(0), Some("MICU"));
    assert_eq!(first_careunit.get(1), None);

    let types = bundle.wait_time_metrics.column("admission_type")?.str()?;
    let counts = bundle.wait_time_metrics.column("ed_wait_time_count")?.u32()?;
    assert_eq!(types.get(0), Some("ELECTIVE"));
    assert_eq!(counts.get(0), Some(0));
    assert_eq!(types.get(1), Some("EMERGENCY"));
    assert_eq!(counts.get(1), Some(2));

    let wards = bundle.ward_metrics.column("curr_wardid")?.f64()?;
    assert_eq!(bundle.ward_metrics.height(), 2);
    assert_eq!(wards.get(0), Some(14.0));
    assert_eq!(wards.get(1), Some(52.0));

    let admission_counts = bundle.hourly_admissions.column("admission_count")?.u32()?;
    let total: u32 = admission_counts.into_iter().flatten().sum();
    assert_eq!(total, 3);

    // the non-numeric ward passes through the hourly table untouched
    assert_eq!(bundle.hourly_transfers.height(), 3);
    Ok(())
}

#[test]
fn missing_input_file_is_fatal() {
    let raw = tempdir().unwrap();

    let err = run_pipeline(raw.path()).unwrap_err();
    match err {
        PipelineError::Load { table, .. } => assert_eq!(table, "ADMISSIONS.csv"),
        other => panic!("expected load error, got {other}"),
    }
}

#[test]
fn unparsable_timestamps_become_null() -> PolarsResult<()> {
    let raw = tempdir().unwrap();
    write_raw_fixtures(raw.path());
    fs::write(
        raw.path().join("ADMISSIONS.csv"),
        "subject_id,hadm_id,admission_type,admittime,dischtime,edregtime,edouttime\n\
         1,100,EMERGENCY,whenever,2023-01-01 20:00:00,,\n",
    )
    .unwrap();

    let tables = loader::load_tables(raw.path()).unwrap();
    let admittime = tables.admissions.column("admittime")?.datetime()?;
    assert_eq!(tables.admissions.height(), 1);
    assert_eq!(admittime.get(0), None);

    // the row survives all the way through with null derived fields
    let bundle = run_pipeline(raw.path()).unwrap();
    let hour = bundle.admissions.column("hour")?.i64()?;
    assert_eq!(hour.get(0), None);
    Ok(())
}

#[test]
fn outputs_round_trip_through_the_loader() -> PolarsResult<()> {
    let raw = tempdir().unwrap();
    write_raw_fixtures(raw.path());
    let bundle = run_pipeline(raw.path()).unwrap();

    let out = tempdir().unwrap();
    let written = outputs::write_bundle(&bundle, out.path()).unwrap();
    assert_eq!(written.len(), 6);
    for name in [
        "admissions.csv",
        "transfers.csv",
        "hourly_stats_admissions.csv",
        "hourly_stats_transfers.csv",
        "metrics_wait_times.csv",
        "metrics_ward_metrics.csv",
    ] {
        assert!(out.path().join(name).exists(), "missing output {name}");
    }

    // feed the written admissions table back through the loader
    let reload = tempdir().unwrap();
    write_raw_fixtures(reload.path());
    fs::copy(
        out.path().join("admissions.csv"),
        reload.path().join("ADMISSIONS.csv"),
    )
    .unwrap();
    let tables = loader::load_tables(reload.path()).unwrap();

    let original: Vec<Option<i64>> = bundle
        .admissions
        .column("admittime")?
        .datetime()?
        .into_iter()
        .collect();
    let reloaded: Vec<Option<i64>> = tables
        .admissions
        .column("admittime")?
        .datetime()?
        .into_iter()
        .collect();
    assert_eq!(original, reloaded);

    let original_wait: Vec<Option<f64>> = bundle
        .admissions
        .column("ed_wait_time")?
        .f64()?
        .into_iter()
        .collect();
    let reloaded_wait: Vec<Option<f64>> = tables
        .admissions
        .column("ed_wait_time")?
        .f64()?
        .into_iter()
        .collect();
    assert_eq!(original_wait, reloaded_wait);
    Ok(())
}
