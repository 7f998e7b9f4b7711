// Tests for the file-level conversion path: path layout, workbook errors and
// a full workbook to NetCDF run

mod common;

use common::*;
use rust_xlsxwriter::Workbook;
use snowpit_converter::converter::read_first_sheet;
use snowpit_converter::dataset::SnowDataset;
use snowpit_converter::{ConversionError, SnowpitConverter, SourceKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Save a temperature log at its expected place under `root`
fn write_temperature_workbook(root: &Path, rows: &[TemperatureRow]) {
    let path = root.join("MOSAiC/snowpit/temperature/metadata_Temperature.xlsx");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, label) in ["Event", "Sample", "Date", "Lat", "Lon", "Height", "Temp"]
        .iter()
        .enumerate()
    {
        worksheet.write_string(0, col as u16, *label).unwrap();
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_string(r, 1, row.series).unwrap();
        worksheet.write_number(r, 2, row.time).unwrap();
        worksheet.write_number(r, 3, LATITUDE).unwrap();
        worksheet.write_number(r, 4, LONGITUDE).unwrap();
        worksheet.write_number(r, 5, row.height).unwrap();
        worksheet.write_number(r, 6, row.value).unwrap();
    }
    workbook.save(&path).unwrap();
}

#[test]
fn test_source_and_output_paths() {
    let config = test_config()
        .with_root_dir("/data/SnowObs")
        .with_output_dir("/tmp/out");
    let converter = SnowpitConverter::new(config);

    assert_eq!(
        converter.source_path(SourceKind::Density),
        PathBuf::from(
            "/data/SnowObs/MOSAiC/snowpit/density/metadata_DensityCutter_removedOvalues.xlsx"
        )
    );
    assert_eq!(
        converter.output_path(SourceKind::Temperature),
        PathBuf::from("/tmp/out/snow1_temperature.nc")
    );
}

#[test]
fn test_missing_workbook() {
    let dir = TempDir::new().unwrap();
    let converter = SnowpitConverter::new(
        test_config()
            .with_root_dir(dir.path())
            .with_output_dir(dir.path()),
    );

    let result = converter.convert_file(SourceKind::Temperature);

    match result {
        Err(ConversionError::WorkbookOpen { path, .. }) => {
            assert!(path.ends_with("temperature/metadata_Temperature.xlsx"));
        }
        other => panic!("Expected WorkbookOpen error, got {other:?}"),
    }
    assert!(!dir.path().join("snow1_temperature.nc").exists());
}

#[test]
fn test_unreadable_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a spreadsheet").unwrap();

    let result = read_first_sheet(&path);

    assert!(matches!(result, Err(ConversionError::WorkbookOpen { .. })));
}

#[test]
fn test_run_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let converter = SnowpitConverter::new(
        test_config()
            .with_root_dir(dir.path())
            .with_output_dir(&out),
    );

    let result = converter.run(&SourceKind::ALL);

    assert!(result.is_err());
    // Output directory is prepared before any file is read
    assert!(out.is_dir());
}

#[test]
fn test_run_converts_temperature_workbook() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    write_temperature_workbook(
        dir.path(),
        &[
            TemperatureRow {
                series: "snow1_T1",
                time: serial(1, 9),
                height: 0.5,
                value: -3.0,
            },
            TemperatureRow {
                series: "snow1_T1",
                time: serial(1, 9),
                height: 200.0,
                value: -21.5,
            },
            TemperatureRow {
                series: "snow2_T1",
                time: serial(1, 12),
                height: 1.0,
                value: -99.0,
            },
            TemperatureRow {
                series: "snow1_T2",
                time: serial(2, 6),
                height: 10.0,
                value: -9.0,
            },
        ],
    );
    let converter = SnowpitConverter::new(
        test_config()
            .with_root_dir(dir.path())
            .with_output_dir(&out),
    );

    let summaries = converter.run(&[SourceKind::Temperature]).unwrap();

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.kind, SourceKind::Temperature);
    assert_eq!(summary.output_path, out.join("snow1_temperature.nc"));
    assert_eq!(summary.matched_rows, 3);
    assert_eq!(summary.time_steps, 2);
    assert_eq!(summary.air_temperature_readings, 1);
    assert!(summary.output_path.is_file());

    let loaded = SnowDataset::read_netcdf(&summary.output_path).unwrap();
    assert_eq!(loaded.kind(), SourceKind::Temperature);
    assert_eq!(loaded.time().len(), 2);
    assert_eq!(loaded.measurement()[[0, 1]], -3.0);
    assert_eq!(loaded.measurement()[[1, 20]], -9.0);
    assert_same_values(&loaded.air_temperature().unwrap().values, &[-21.5, f64::NAN]);
    assert_same_values(&loaded.latitude().values, &[LATITUDE, LATITUDE]);
}
