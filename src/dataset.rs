//! Dataset Assembler
//!
//! Bundles a finished grid with its coordinates and attributes, and writes it
//! as a NetCDF file with dimensions `time` × `height`.

use chrono::{DateTime, NaiveDateTime};
use ndarray::Array2;
use std::path::Path;
use tracing::{debug, info};

use crate::grid::FinishedGrid;
use crate::source::SourceKind;

pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";
pub const TIME_CALENDAR: &str = "proleptic_gregorian";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Attribute {attribute} not found on {owner}")]
    MissingAttribute { owner: String, attribute: String },

    #[error("Invalid dataset: {0}")]
    Invalid(String),
}

/// Descriptive attributes carried by every data variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub long_name: String,
    pub units: String,
}

impl Attributes {
    pub fn new(long_name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            long_name: long_name.into(),
            units: units.into(),
        }
    }
}

/// One per-time variable (`t2m`, `lat`, `lon`)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub attributes: Attributes,
    pub values: Vec<f64>,
}

/// Labeled, attributed snowpit dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SnowDataset {
    kind: SourceKind,
    series_prefix: String,
    measurement_name: String,
    measurement_attributes: Attributes,
    measurement: Array2<f64>,
    air_temperature: Option<TimeSeries>,
    latitude: TimeSeries,
    longitude: TimeSeries,
    time: Vec<NaiveDateTime>,
    height: Vec<f64>,
    height_attributes: Attributes,
}

impl SnowDataset {
    /// Assemble a dataset from a grid already truncated to `time.len()` rows
    pub fn assemble(
        kind: SourceKind,
        series_prefix: &str,
        grid: FinishedGrid,
        height: &[f64],
        time: Vec<NaiveDateTime>,
    ) -> Self {
        let field = kind.field();
        let air_temperature = kind.records_air_temperature().then(|| TimeSeries {
            name: "t2m".to_string(),
            attributes: Attributes::new("2m air temperature", "Celsius degrees"),
            values: grid.air_temperature,
        });

        Self {
            kind,
            series_prefix: series_prefix.to_string(),
            measurement_name: field.variable.to_string(),
            measurement_attributes: Attributes::new(field.long_name, field.units),
            measurement: grid.values,
            air_temperature,
            latitude: TimeSeries {
                name: "lat".to_string(),
                attributes: Attributes::new("Latitude", "degrees"),
                values: grid.latitude,
            },
            longitude: TimeSeries {
                name: "lon".to_string(),
                attributes: Attributes::new("Longitude", "degrees"),
                values: grid.longitude,
            },
            time,
            height: height.to_vec(),
            height_attributes: Attributes::new("snow height", "cm"),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn series_prefix(&self) -> &str {
        &self.series_prefix
    }

    pub fn measurement_name(&self) -> &str {
        &self.measurement_name
    }

    pub fn measurement_attributes(&self) -> &Attributes {
        &self.measurement_attributes
    }

    pub fn measurement(&self) -> &Array2<f64> {
        &self.measurement
    }

    pub fn air_temperature(&self) -> Option<&TimeSeries> {
        self.air_temperature.as_ref()
    }

    pub fn latitude(&self) -> &TimeSeries {
        &self.latitude
    }

    pub fn longitude(&self) -> &TimeSeries {
        &self.longitude
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn height(&self) -> &[f64] {
        &self.height
    }

    pub fn height_attributes(&self) -> &Attributes {
        &self.height_attributes
    }

    /// Output file name, e.g. `snow1_density.nc`
    pub fn file_name(&self) -> String {
        self.kind.output_file_name(&self.series_prefix)
    }

    fn scalars(&self) -> impl Iterator<Item = &TimeSeries> {
        self.air_temperature
            .iter()
            .chain([&self.latitude, &self.longitude])
    }

    pub fn write_netcdf(&self, path: &Path) -> Result<(), DatasetError> {
        info!("Writing {} dataset to {}", self.kind, path.display());

        let mut file = netcdf::create(path)?;
        file.add_attribute("series", self.series_prefix.as_str())?;
        file.add_attribute("measurement", self.kind.measurement_name())?;

        file.add_dimension("time", self.time.len())?;
        file.add_dimension("height", self.height.len())?;

        {
            let seconds: Vec<f64> = self
                .time
                .iter()
                .map(|t| t.and_utc().timestamp() as f64)
                .collect();
            let mut var = file.add_variable::<f64>("time", &["time"])?;
            var.put_attribute("units", TIME_UNITS)?;
            var.put_attribute("calendar", TIME_CALENDAR)?;
            put_all(&mut var, &seconds)?;
        }
        {
            let mut var = file.add_variable::<f64>("height", &["height"])?;
            put_attributes(&mut var, &self.height_attributes)?;
            put_all(&mut var, &self.height)?;
        }
        {
            let values: Vec<f64> = self.measurement.iter().copied().collect();
            let mut var =
                file.add_variable::<f64>(&self.measurement_name, &["time", "height"])?;
            var.set_fill_value(f64::NAN)?;
            put_attributes(&mut var, &self.measurement_attributes)?;
            put_all(&mut var, &values)?;
        }
        for series in self.scalars() {
            let mut var = file.add_variable::<f64>(&series.name, &["time"])?;
            var.set_fill_value(f64::NAN)?;
            put_attributes(&mut var, &series.attributes)?;
            put_all(&mut var, &series.values)?;
        }

        debug!(
            time_steps = self.time.len(),
            heights = self.height.len(),
            "Dataset written"
        );
        Ok(())
    }

    /// Read a dataset previously written by [`SnowDataset::write_netcdf`]
    pub fn read_netcdf(path: &Path) -> Result<Self, DatasetError> {
        let file = netcdf::open(path)?;

        let series_prefix = global_text(&file, "series")?;
        let kind = global_text(&file, "measurement")?
            .parse::<SourceKind>()
            .map_err(DatasetError::Invalid)?;
        let field = kind.field();

        let time = read_values(&file, "time")?
            .into_iter()
            .map(|secs| {
                DateTime::from_timestamp(secs as i64, 0)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| DatasetError::Invalid(format!("time out of range: {secs}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let height = read_values(&file, "height")?;

        let measurement = Array2::from_shape_vec(
            (time.len(), height.len()),
            read_values(&file, field.variable)?,
        )
        .map_err(|e| DatasetError::Invalid(format!("{}: {e}", field.variable)))?;

        let air_temperature = if kind.records_air_temperature() {
            Some(read_series(&file, "t2m")?)
        } else {
            None
        };

        Ok(Self {
            kind,
            series_prefix,
            measurement_name: field.variable.to_string(),
            measurement_attributes: read_attributes(&file, field.variable)?,
            measurement,
            air_temperature,
            latitude: read_series(&file, "lat")?,
            longitude: read_series(&file, "lon")?,
            time,
            height,
            height_attributes: read_attributes(&file, "height")?,
        })
    }
}

fn put_attributes(
    var: &mut netcdf::VariableMut,
    attributes: &Attributes,
) -> Result<(), DatasetError> {
    var.put_attribute("long_name", attributes.long_name.as_str())?;
    var.put_attribute("units", attributes.units.as_str())?;
    Ok(())
}

fn put_all(var: &mut netcdf::VariableMut, values: &[f64]) -> Result<(), DatasetError> {
    // A zero-length dimension has nothing to write
    if !values.is_empty() {
        var.put_values(values, ..)?;
    }
    Ok(())
}

fn variable<'f>(file: &'f netcdf::File, name: &str) -> Result<netcdf::Variable<'f>, DatasetError> {
    file.variable(name)
        .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
}

fn read_values(file: &netcdf::File, name: &str) -> Result<Vec<f64>, DatasetError> {
    let var = variable(file, name)?;
    let len: usize = var.dimensions().iter().map(|d| d.len()).product();
    if len == 0 {
        return Ok(Vec::new());
    }
    Ok(var.get_values::<f64, _>(..)?)
}

fn read_series(file: &netcdf::File, name: &str) -> Result<TimeSeries, DatasetError> {
    Ok(TimeSeries {
        name: name.to_string(),
        attributes: read_attributes(file, name)?,
        values: read_values(file, name)?,
    })
}

fn read_attributes(file: &netcdf::File, name: &str) -> Result<Attributes, DatasetError> {
    let var = variable(file, name)?;
    let text = |attribute: &str| -> Result<String, DatasetError> {
        let missing = || DatasetError::MissingAttribute {
            owner: name.to_string(),
            attribute: attribute.to_string(),
        };
        match var.attribute(attribute).ok_or_else(missing)?.value()? {
            netcdf::AttributeValue::Str(s) => Ok(s),
            _ => Err(missing()),
        }
    };
    Ok(Attributes {
        long_name: text("long_name")?,
        units: text("units")?,
    })
}

fn global_text(file: &netcdf::File, attribute: &str) -> Result<String, DatasetError> {
    let missing = || DatasetError::MissingAttribute {
        owner: "file".to_string(),
        attribute: attribute.to_string(),
    };
    match file.attribute(attribute).ok_or_else(missing)?.value()? {
        netcdf::AttributeValue::Str(s) => Ok(s),
        _ => Err(missing()),
    }
}
