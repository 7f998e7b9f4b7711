use std::path::PathBuf;

use crate::axis::AxisError;
use crate::dataset::DatasetError;
use crate::scanner::ScanError;
use crate::source::SourceKind;

/// Error types for converting one snowpit workbook
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Failed to open workbook {path}: {source}")]
    WorkbookOpen {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook {0} has no worksheet")]
    EmptyWorkbook(PathBuf),

    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Row {row}: {source}")]
    OutOfRange {
        row: usize,
        #[source]
        source: AxisError,
    },

    #[error("No rows for series {series} in {kind} source")]
    NoMatchingRows { series: String, kind: SourceKind },

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
