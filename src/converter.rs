use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::axis::{HeightAxis, TimeAxis};
use crate::config::ConversionConfig;
use crate::dataset::SnowDataset;
use crate::error::ConversionError;
use crate::grid::{GridWriter, Placement};
use crate::scanner::RowScanner;
use crate::source::SourceKind;

/// Outcome of converting one source workbook
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub kind: SourceKind,
    pub output_path: PathBuf,
    pub matched_rows: usize,
    pub time_steps: usize,
    pub air_temperature_readings: usize,
}

/// Converts snowpit metadata workbooks into gridded NetCDF datasets
pub struct SnowpitConverter {
    config: ConversionConfig,
    heights: HeightAxis,
}

impl SnowpitConverter {
    pub fn new(config: ConversionConfig) -> Self {
        let heights = HeightAxis::new(config.max_height_cm, config.height_resolution_cm);
        Self { config, heights }
    }

    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        self.config.snowpit_dir().join(kind.relative_path())
    }

    pub fn output_path(&self, kind: SourceKind) -> PathBuf {
        self.config
            .output_dir
            .join(kind.output_file_name(&self.config.series_prefix))
    }

    /// Convert every requested source kind in order, stopping at the first failure
    pub fn run(&self, kinds: &[SourceKind]) -> Result<Vec<ConversionSummary>, ConversionError> {
        fs::create_dir_all(&self.config.output_dir)?;
        kinds.iter().map(|&kind| self.convert_file(kind)).collect()
    }

    /// Read the workbook for `kind`, grid it and write its NetCDF file
    #[instrument(skip(self))]
    pub fn convert_file(&self, kind: SourceKind) -> Result<ConversionSummary, ConversionError> {
        let path = self.source_path(kind);
        let range = read_first_sheet(&path)?;

        let (dataset, matched_rows) = self.convert_table(kind, &range)?;
        let output_path = self.output_path(kind);
        dataset.write_netcdf(&output_path)?;

        let air_temperature_readings = dataset
            .air_temperature()
            .map(|t2m| t2m.values.iter().filter(|v| !v.is_nan()).count())
            .unwrap_or(0);

        info!(
            "Converted {} rows into {} time steps: {}",
            matched_rows,
            dataset.time().len(),
            output_path.display()
        );

        Ok(ConversionSummary {
            kind,
            output_path,
            matched_rows,
            time_steps: dataset.time().len(),
            air_temperature_readings,
        })
    }

    /// Grid one table of rows. Returns the dataset and the number of matched rows.
    #[instrument(skip(self, range))]
    pub fn convert_table(
        &self,
        kind: SourceKind,
        range: &Range<Data>,
    ) -> Result<(SnowDataset, usize), ConversionError> {
        let config = &self.config;
        let mut times = TimeAxis::new(config.max_time_steps);
        let mut writer = GridWriter::new(
            &self.heights,
            config.max_time_steps,
            config.sentinel_height_cm,
        );
        let mut matched_rows = 0;

        let scanner = RowScanner::new(
            range,
            kind.layout(),
            &config.series_prefix,
            config.date_mode,
        );
        for scanned in scanner {
            let row = scanned?;
            let out_of_range = |source| ConversionError::OutOfRange {
                row: row.row,
                source,
            };

            let slot = times.slot_for(row.timestamp).map_err(out_of_range)?;
            debug!(timestamp = %row.timestamp, slot, row = row.row, "Matched row");

            match writer.write(slot, &row).map_err(out_of_range)? {
                Placement::AirTemperature => debug!(slot, "Recorded 2 m air temperature"),
                Placement::Cells { .. } | Placement::NoValue => {}
            }
            matched_rows += 1;
        }

        if times.is_empty() {
            return Err(ConversionError::NoMatchingRows {
                series: config.series_prefix.clone(),
                kind,
            });
        }

        info!(
            "Matched {} rows for series {} across {} time steps",
            matched_rows,
            config.series_prefix,
            times.len()
        );

        let grid = writer.finish(times.len());
        let dataset = SnowDataset::assemble(
            kind,
            &config.series_prefix,
            grid,
            self.heights.values(),
            times.into_times(),
        );
        Ok((dataset, matched_rows))
    }
}

/// Open a workbook and return its first worksheet
pub fn read_first_sheet(path: &Path) -> Result<Range<Data>, ConversionError> {
    info!("Opening workbook: {}", path.display());

    let mut workbook =
        open_workbook_auto(path).map_err(|source| ConversionError::WorkbookOpen {
            path: path.to_path_buf(),
            source,
        })?;

    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(source)) => Err(ConversionError::WorkbookOpen {
            path: path.to_path_buf(),
            source,
        }),
        None => Err(ConversionError::EmptyWorkbook(path.to_path_buf())),
    }
}
