//! Height and time coordinate axes
//!
//! The height axis is fixed for a run and maps measured heights to grid slots.
//! The time axis grows as new timestamps are encountered.

use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Heights within this distance of a slot are treated as exact matches
const HEIGHT_TOLERANCE_CM: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AxisError {
    #[error("Height {height} cm is not on the axis (0 to {max} cm every {resolution} cm)")]
    HeightNotOnAxis {
        height: f64,
        max: f64,
        resolution: f64,
    },

    #[error("More than {max} distinct timestamps; {timestamp} does not fit")]
    TooManyTimeSteps {
        max: usize,
        timestamp: NaiveDateTime,
    },

    #[error("Time slot {slot} is outside a grid of {max} time steps")]
    TimeSlotOutOfRange { slot: usize, max: usize },
}

/// Fixed, evenly spaced heights from 0 to a maximum
#[derive(Debug, Clone, PartialEq)]
pub struct HeightAxis {
    resolution: f64,
    values: Vec<f64>,
}

impl HeightAxis {
    pub fn new(max_height: f64, resolution: f64) -> Self {
        let slots = (max_height / resolution).round() as usize + 1;
        let values = (0..slots).map(|i| i as f64 * resolution).collect();
        Self { resolution, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn max(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Resolve a height to its slot, requiring an exact match on the axis
    pub fn slot(&self, height: f64) -> Result<usize, AxisError> {
        let not_on_axis = || AxisError::HeightNotOnAxis {
            height,
            max: self.max(),
            resolution: self.resolution,
        };

        if !height.is_finite() {
            return Err(not_on_axis());
        }

        let position = height / self.resolution;
        let nearest = position.round();
        if nearest < 0.0 || (position - nearest).abs() * self.resolution > HEIGHT_TOLERANCE_CM {
            return Err(not_on_axis());
        }

        let slot = nearest as usize;
        if slot >= self.values.len() {
            return Err(not_on_axis());
        }
        Ok(slot)
    }
}

/// Ordered distinct timestamps in first-seen order
#[derive(Debug, Clone)]
pub struct TimeAxis {
    max_steps: usize,
    times: Vec<NaiveDateTime>,
    slots: HashMap<NaiveDateTime, usize>,
}

impl TimeAxis {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            times: Vec::new(),
            slots: HashMap::new(),
        }
    }

    /// Slot for a timestamp, appending it to the axis the first time it is seen
    pub fn slot_for(&mut self, timestamp: NaiveDateTime) -> Result<usize, AxisError> {
        if let Some(&slot) = self.slots.get(&timestamp) {
            return Ok(slot);
        }

        if self.times.len() >= self.max_steps {
            return Err(AxisError::TooManyTimeSteps {
                max: self.max_steps,
                timestamp,
            });
        }

        let slot = self.times.len();
        self.times.push(timestamp);
        self.slots.insert(timestamp, slot);
        Ok(slot)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn into_times(self) -> Vec<NaiveDateTime> {
        self.times
    }
}
