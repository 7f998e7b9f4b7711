/// Grid Writer
///
/// Places scanned measurements on the dense (time, height) grid. Missing cells
/// hold `NaN`. Density samples cover a slab of heights and two slabs that share
/// a discretized cell are averaged.
use ndarray::{s, Array2};
use tracing::warn;

use crate::axis::{AxisError, HeightAxis};
use crate::scanner::{HeightDescriptor, ScannedRow};

/// Where a record ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stored as the 2 m air temperature of the time slot
    AirTemperature,
    /// Stored in the inclusive height-slot range `first..=last`
    Cells { first: usize, last: usize },
    /// Row had no value; only the location was recorded
    NoValue,
}

/// Grid and per-time scalars after truncation to the real time-axis length
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedGrid {
    pub values: Array2<f64>,
    pub air_temperature: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

pub struct GridWriter<'a> {
    heights: &'a HeightAxis,
    sentinel_height: f64,
    values: Array2<f64>,
    contributions: Array2<u32>,
    air_temperature: Vec<f64>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

impl<'a> GridWriter<'a> {
    pub fn new(heights: &'a HeightAxis, max_time_steps: usize, sentinel_height: f64) -> Self {
        let shape = (max_time_steps, heights.len());
        Self {
            heights,
            sentinel_height,
            values: Array2::from_elem(shape, f64::NAN),
            contributions: Array2::zeros(shape),
            air_temperature: vec![f64::NAN; max_time_steps],
            latitude: vec![f64::NAN; max_time_steps],
            longitude: vec![f64::NAN; max_time_steps],
        }
    }

    /// Write one scanned row at `time_slot`
    ///
    /// `time_slot` should come from a `TimeAxis` built with the same maximum.
    pub fn write(&mut self, time_slot: usize, row: &ScannedRow) -> Result<Placement, AxisError> {
        if time_slot >= self.values.nrows() {
            return Err(AxisError::TimeSlotOutOfRange {
                slot: time_slot,
                max: self.values.nrows(),
            });
        }

        if let HeightDescriptor::Single(height) = row.height {
            if height == self.sentinel_height {
                if let Some(value) = row.value {
                    self.air_temperature[time_slot] = value;
                }
                return Ok(Placement::AirTemperature);
            }
        }

        let placement = match (row.height, row.value) {
            (HeightDescriptor::Single(height), Some(value)) => {
                let slot = self.heights.slot(height)?;
                self.values[[time_slot, slot]] = value;
                self.contributions[[time_slot, slot]] = 1;
                Placement::Cells {
                    first: slot,
                    last: slot,
                }
            }
            (HeightDescriptor::Range { top, bottom }, Some(value)) => {
                let top_slot = self.heights.slot(top)?;
                let bottom_slot = self.heights.slot(bottom)?;
                let (first, last) = (top_slot.min(bottom_slot), top_slot.max(bottom_slot));
                self.accumulate(time_slot, first, last, value, row.row);
                Placement::Cells { first, last }
            }
            (height, None) => {
                // Still reject heights that could never be placed
                match height {
                    HeightDescriptor::Single(h) => {
                        self.heights.slot(h)?;
                    }
                    HeightDescriptor::Range { top, bottom } => {
                        self.heights.slot(top)?;
                        self.heights.slot(bottom)?;
                    }
                }
                warn!(row = row.row, "Row has no measurement value");
                Placement::NoValue
            }
        };

        if let Some(lat) = row.latitude {
            self.latitude[time_slot] = lat;
        }
        if let Some(lon) = row.longitude {
            self.longitude[time_slot] = lon;
        }

        Ok(placement)
    }

    /// Average `value` into every cell of `first..=last`
    fn accumulate(&mut self, time_slot: usize, first: usize, last: usize, value: f64, row: usize) {
        let mut cells = self.values.slice_mut(s![time_slot, first..=last]);
        let mut counts = self.contributions.slice_mut(s![time_slot, first..=last]);

        for (cell, count) in cells.iter_mut().zip(counts.iter_mut()) {
            if *count == 0 || cell.is_nan() {
                *cell = value;
                *count = 1;
                continue;
            }

            if *count >= 2 {
                warn!(
                    row,
                    time_slot,
                    contributions = *count + 1,
                    "More than two height ranges overlap one cell"
                );
            }
            let n = f64::from(*count);
            *cell = (*cell * n + value) / (n + 1.0);
            *count += 1;
        }
    }

    /// Truncate the grid and scalars to the first `time_steps` slots
    pub fn finish(self, time_steps: usize) -> FinishedGrid {
        let time_steps = time_steps.min(self.values.nrows());
        let mut air_temperature = self.air_temperature;
        let mut latitude = self.latitude;
        let mut longitude = self.longitude;
        air_temperature.truncate(time_steps);
        latitude.truncate(time_steps);
        longitude.truncate(time_steps);

        FinishedGrid {
            values: self.values.slice(s![..time_steps, ..]).to_owned(),
            air_temperature,
            latitude,
            longitude,
        }
    }
}
