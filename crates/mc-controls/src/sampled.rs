//! Sample-period bookkeeping for the control loop.
//!
//! The regulator runs at a fixed interval. [`SampleConfig`] carries that
//! interval; [`SampleClock`] tracks the next deadline on a monotonic time
//! axis (seconds since the loop started) so a scheduler can sleep until it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Sample configuration for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// # Errors
    ///
    /// Returns error if `dt` is not a positive finite number.
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }

    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sample frequency must be positive",
            });
        }
        Self::new(1.0 / freq_hz)
    }

    /// Sample frequency in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.dt)
    }
}

/// Tracks when the next sample is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    /// Time of next scheduled sample.
    pub next_sample_time: f64,
}

impl SampleClock {
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
        }
    }

    /// Returns `true` if `current_time >= next_sample_time`.
    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Move the deadline forward by one period.
    ///
    /// Deadlines are anchored to the start time, so a late tick does not shift
    /// the ones after it.
    pub fn advance(&mut self) {
        self.next_sample_time += self.config.dt;
    }

    pub fn reset(&mut self, current_time: f64) {
        self.next_sample_time = current_time + self.config.dt;
    }

    pub fn time_until_sample(&self, current_time: f64) -> f64 {
        (self.next_sample_time - current_time).max(0.0)
    }
}
