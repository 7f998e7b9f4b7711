// Source kinds and their fixed spreadsheet layouts
//
// Each snowpit metadata workbook stores one measurement category with its own
// column positions. Column indices are absolute (0-indexed) sheet columns.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Column holding the sample series label (e.g. "snow1_T3")
pub const SERIES_COLUMN: usize = 1;

/// Where the height (or height range) of a measurement lives in a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightColumns {
    Single(usize),
    Range { top: usize, bottom: usize },
}

/// Column positions for one source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub series: usize,
    pub time: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub value: usize,
    pub height: HeightColumns,
}

/// Name and attributes of the primary output field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub variable: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Temperature,
    Density,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Temperature, SourceKind::Density];

    pub fn layout(self) -> RowLayout {
        match self {
            SourceKind::Temperature => RowLayout {
                series: SERIES_COLUMN,
                time: 2,
                latitude: 3,
                longitude: 4,
                value: 6,
                height: HeightColumns::Single(5),
            },
            SourceKind::Density => RowLayout {
                series: SERIES_COLUMN,
                time: 4,
                latitude: 2,
                longitude: 3,
                value: 7,
                height: HeightColumns::Range { top: 5, bottom: 6 },
            },
        }
    }

    /// Workbook path relative to the `MOSAiC/snowpit` directory
    pub fn relative_path(self) -> PathBuf {
        match self {
            SourceKind::Temperature => {
                ["temperature", "metadata_Temperature.xlsx"].iter().collect()
            }
            SourceKind::Density => ["density", "metadata_DensityCutter_removedOvalues.xlsx"]
                .iter()
                .collect(),
        }
    }

    /// Suffix used in the output file name
    pub fn measurement_name(self) -> &'static str {
        match self {
            SourceKind::Temperature => "temperature",
            SourceKind::Density => "density",
        }
    }

    pub fn output_file_name(self, series_prefix: &str) -> String {
        format!("{series_prefix}_{}.nc", self.measurement_name())
    }

    pub fn field(self) -> FieldSpec {
        match self {
            SourceKind::Temperature => FieldSpec {
                variable: "temp",
                long_name: "snow temperature",
                units: "Celsius degrees",
            },
            SourceKind::Density => FieldSpec {
                variable: "density",
                long_name: "snow density",
                units: "kg.m-3",
            },
        }
    }

    /// Only temperature logs carry 2 m air temperature rows
    pub fn records_air_temperature(self) -> bool {
        matches!(self, SourceKind::Temperature)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.measurement_name())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" => Ok(SourceKind::Temperature),
            "density" => Ok(SourceKind::Density),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_names() {
        assert_eq!(
            SourceKind::Temperature.output_file_name("snow1"),
            "snow1_temperature.nc"
        );
        assert_eq!(
            SourceKind::Density.output_file_name("snow1"),
            "snow1_density.nc"
        );
    }

    #[test]
    fn test_layouts_use_series_column() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.layout().series, 1);
        }
    }

    #[test]
    fn test_density_layout_is_range() {
        assert_eq!(
            SourceKind::Density.layout().height,
            HeightColumns::Range { top: 5, bottom: 6 }
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            SourceKind::Temperature.relative_path(),
            PathBuf::from("temperature/metadata_Temperature.xlsx")
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Density".parse::<SourceKind>(), Ok(SourceKind::Density));
        assert_eq!("temp".parse::<SourceKind>(), Ok(SourceKind::Temperature));
        assert!("swe".parse::<SourceKind>().is_err());
    }
}
