pub mod axis;
pub mod config;
pub mod converter;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod scanner;
pub mod source;

pub use config::{ConversionConfig, DateMode};
pub use converter::{ConversionSummary, SnowpitConverter};
pub use error::ConversionError;
pub use source::SourceKind;
