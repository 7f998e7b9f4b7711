// Shared helpers for building snowpit sheets in memory
#![allow(dead_code)]

use calamine::{Data, Range};
use snowpit_converter::ConversionConfig;

/// Excel serial for 2020-01-01 00:00 in the 1900 date mode
pub const JAN_1_2020: f64 = 43831.0;

pub fn serial(day: u32, hour: u32) -> f64 {
    JAN_1_2020 + f64::from(day - 1) + f64::from(hour) / 24.0
}

pub fn test_config() -> ConversionConfig {
    ConversionConfig::default()
}

/// One row of a temperature log (layout: series 1, time 2, lat 3, lon 4, height 5, value 6)
pub struct TemperatureRow<'a> {
    pub series: &'a str,
    pub time: f64,
    pub height: f64,
    pub value: f64,
}

/// One row of a density log (layout: lat 2, lon 3, time 4, top 5, bottom 6, value 7)
pub struct DensityRow<'a> {
    pub series: &'a str,
    pub time: f64,
    pub top: f64,
    pub bottom: f64,
    pub value: f64,
}

pub const LATITUDE: f64 = 85.12;
pub const LONGITUDE: f64 = 118.4;

fn header(range: &mut Range<Data>, labels: &[&str]) {
    for (col, label) in labels.iter().enumerate() {
        range.set_value((0, col as u32), Data::String(label.to_string()));
    }
}

pub fn temperature_sheet(rows: &[TemperatureRow]) -> Range<Data> {
    let mut range = Range::new((0, 0), (rows.len() as u32, 7));
    header(
        &mut range,
        &["Event", "Sample", "Date", "Lat", "Lon", "Height", "Temp"],
    );

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        range.set_value((r, 1), Data::String(row.series.to_string()));
        range.set_value((r, 2), Data::Float(row.time));
        range.set_value((r, 3), Data::Float(LATITUDE));
        range.set_value((r, 4), Data::Float(LONGITUDE));
        range.set_value((r, 5), Data::Float(row.height));
        range.set_value((r, 6), Data::Float(row.value));
    }
    range
}

pub fn density_sheet(rows: &[DensityRow]) -> Range<Data> {
    let mut range = Range::new((0, 0), (rows.len() as u32, 7));
    header(
        &mut range,
        &["Event", "Sample", "Lat", "Lon", "Date", "Top", "Bottom", "Density"],
    );

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        range.set_value((r, 1), Data::String(row.series.to_string()));
        range.set_value((r, 2), Data::Float(LATITUDE));
        range.set_value((r, 3), Data::Float(LONGITUDE));
        range.set_value((r, 4), Data::Float(row.time));
        range.set_value((r, 5), Data::Float(row.top));
        range.set_value((r, 6), Data::Float(row.bottom));
        range.set_value((r, 7), Data::Float(row.value));
    }
    range
}

/// Compare two float slices treating NaN as equal to NaN
pub fn assert_same_values(left: &[f64], right: &[f64]) {
    assert_eq!(left.len(), right.len(), "length mismatch");
    for (i, (l, r)) in left.iter().zip(right).enumerate() {
        assert!(
            (l.is_nan() && r.is_nan()) || l == r,
            "value {i} differs: {l} vs {r}"
        );
    }
}
