/// Snowpit Row Scanner
///
/// Walks the rows of a metadata sheet, keeps the rows of one sample series and
/// extracts the measurement fields named by a [`RowLayout`].
///
/// Column indices are absolute sheet positions. calamine trims a worksheet
/// range to its used area, so cells are looked up with `get_value` rather than
/// relative `get`.
use calamine::{Data, Range};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::config::DateMode;
use crate::source::{HeightColumns, RowLayout};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid data at row {row}, col {col}: {msg}")]
    InvalidCell { row: usize, col: usize, msg: String },
}

/// Height of a measurement: a point (temperature) or a sampled slab (density)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightDescriptor {
    Single(f64),
    Range { top: f64, bottom: f64 },
}

/// Fields extracted from one matching row
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedRow {
    /// Absolute sheet row (0-indexed)
    pub row: usize,
    pub timestamp: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: HeightDescriptor,
    pub value: Option<f64>,
}

/// Lazy iterator over the rows of one series
pub struct RowScanner<'a> {
    range: &'a Range<Data>,
    layout: RowLayout,
    series_prefix: &'a str,
    date_mode: DateMode,
    next_row: u32,
    end_row: u32,
}

impl<'a> RowScanner<'a> {
    pub fn new(
        range: &'a Range<Data>,
        layout: RowLayout,
        series_prefix: &'a str,
        date_mode: DateMode,
    ) -> Self {
        let (next_row, end_row) = match (range.start(), range.end()) {
            (Some((start, _)), Some((end, _))) => (start, end + 1),
            _ => (0, 0),
        };

        Self {
            range,
            layout,
            series_prefix,
            date_mode,
            next_row,
            end_row,
        }
    }

    fn cell(&self, row: u32, col: usize) -> Option<&'a Data> {
        self.range.get_value((row, col as u32))
    }

    fn matches_series(&self, row: u32) -> bool {
        match self.cell(row, self.layout.series) {
            Some(Data::String(s)) => s.starts_with(self.series_prefix),
            _ => false,
        }
    }

    fn extract(&self, row: u32) -> Result<ScannedRow, ScanError> {
        let layout = &self.layout;

        let time_cell = self.cell(row, layout.time);
        let timestamp = time_cell
            .and_then(|data| parse_timestamp(data, self.date_mode))
            .ok_or_else(|| invalid(row, layout.time, "expected a date", time_cell))?;

        let height = match layout.height {
            HeightColumns::Single(col) => {
                HeightDescriptor::Single(self.required_number(row, col)?)
            }
            HeightColumns::Range { top, bottom } => HeightDescriptor::Range {
                top: self.required_number(row, top)?,
                bottom: self.required_number(row, bottom)?,
            },
        };

        Ok(ScannedRow {
            row: row as usize,
            timestamp,
            latitude: self.optional_number(row, layout.latitude)?,
            longitude: self.optional_number(row, layout.longitude)?,
            height,
            value: self.optional_number(row, layout.value)?,
        })
    }

    fn required_number(&self, row: u32, col: usize) -> Result<f64, ScanError> {
        self.optional_number(row, col)?
            .ok_or_else(|| invalid(row, col, "expected a number", self.cell(row, col)))
    }

    /// Empty cells are `None`; text that is not a number is an error
    fn optional_number(&self, row: u32, col: usize) -> Result<Option<f64>, ScanError> {
        match self.cell(row, col) {
            Some(Data::Float(f)) => Ok(Some(*f)),
            Some(Data::Int(i)) => Ok(Some(*i as f64)),
            Some(Data::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    trimmed
                        .parse::<f64>()
                        .map(Some)
                        .map_err(|_| invalid(row, col, "expected a number", self.cell(row, col)))
                }
            }
            Some(Data::Empty) | None => Ok(None),
            other => Err(invalid(row, col, "expected a number", other)),
        }
    }
}

impl Iterator for RowScanner<'_> {
    type Item = Result<ScannedRow, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_row < self.end_row {
            let row = self.next_row;
            self.next_row += 1;

            if self.matches_series(row) {
                return Some(self.extract(row));
            }
        }
        None
    }
}

fn invalid(row: u32, col: usize, expected: &str, got: Option<&Data>) -> ScanError {
    ScanError::InvalidCell {
        row: row as usize,
        col,
        msg: format!("{expected}, got: {got:?}"),
    }
}

/// Decode a timestamp cell to the nearest second
pub fn parse_timestamp(data: &Data, date_mode: DateMode) -> Option<NaiveDateTime> {
    let parsed = match data {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::Float(f) => excel_serial_to_datetime(*f, date_mode),
        Data::Int(i) => excel_serial_to_datetime(*i as f64, date_mode),
        Data::DateTimeIso(s) | Data::String(s) => parse_iso_datetime(s),
        _ => None,
    };
    parsed.map(round_to_second)
}

/// Convert an Excel serial date (days since the workbook epoch) to a datetime
pub fn excel_serial_to_datetime(serial: f64, date_mode: DateMode) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let epoch = match date_mode {
        // 1899-12-30 absorbs Excel's phantom 1900-02-29
        DateMode::Epoch1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateMode::Epoch1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    }
    .and_hms_opt(0, 0, 0)?;

    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    .or_else(|| {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

fn round_to_second(dt: NaiveDateTime) -> NaiveDateTime {
    let carry = if dt.nanosecond() >= 500_000_000 {
        Duration::seconds(1)
    } else {
        Duration::zero()
    };
    dt.with_nanosecond(0).unwrap_or(dt) + carry
}
