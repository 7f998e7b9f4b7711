use std::env;
use std::path::PathBuf;

/// Serial-date epoch used by a workbook for raw numeric date cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMode {
    /// Windows epoch (1899-12-30, with Excel's leap-year quirk folded in)
    #[default]
    Epoch1900,
    /// Mac epoch (1904-01-01)
    Epoch1904,
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Directory ending in `SnowObs` that holds the `MOSAiC/snowpit` tree
    pub root_dir: PathBuf,
    pub output_dir: PathBuf,
    pub series_prefix: String,
    pub max_height_cm: f64,
    pub height_resolution_cm: f64,
    pub max_time_steps: usize,
    /// Height reserved for 2 m air temperature readings
    pub sentinel_height_cm: f64,
    pub date_mode: DateMode,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            series_prefix: "snow1".to_string(),
            max_height_cm: 36.0,
            height_resolution_cm: 0.5,
            max_time_steps: 50,
            sentinel_height_cm: 200.0,
            date_mode: DateMode::Epoch1900,
        }
    }
}

impl ConversionConfig {
    /// Compiled-in tunables with directories taken from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_dir: env::var("SNOWOBS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.root_dir.clone()),
            output_dir: env::var("SNOWPIT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir.clone()),
            ..defaults
        }
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn snowpit_dir(&self) -> PathBuf {
        self.root_dir.join("MOSAiC").join("snowpit")
    }
}
