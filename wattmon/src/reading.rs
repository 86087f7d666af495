//! Telemetry reading type shared by every sampling backend.
//!
//! A [`Reading`] is one instantaneous sample of the electrical line. Readers
//! always receive copies of the sampler's internal pair (current and
//! last-valid), never references, so a reading can never be observed with
//! fields from two different ticks.

use serde::Serialize;

/// One instantaneous telemetry sample.
///
/// Validity follows the line-side convention: a reading is valid when
/// `voltage > 0` and `current >= 0`. A zero-voltage reading means the sensor
/// produced nothing usable this tick; the sampler keeps publishing it as the
/// current reading but does not promote it to last-valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Reading {
    /// Line voltage in volts.
    pub voltage: f64,
    /// Line current in amperes.
    pub current: f64,
    /// Real (active) power in watts.
    pub real_power: f64,
    /// Apparent power in volt-amperes.
    pub apparent_power: f64,
    /// Reactive power in volt-amperes reactive, always >= 0.
    pub reactive_power: f64,
    /// Dimensionless power factor.
    pub power_factor: f64,
    /// Line frequency in hertz.
    pub frequency: f64,
    /// Cumulative energy in kilowatt-hours.
    ///
    /// Monotonically non-decreasing except on an explicit energy reset,
    /// which sets it back to 0.
    pub cumulative_energy: f64,
    /// Wall-clock sample time in milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
}

impl Reading {
    /// Returns true when the sample is usable: `voltage > 0 && current >= 0`.
    pub fn is_valid(&self) -> bool {
        self.voltage > 0.0 && self.current >= 0.0
    }

    /// Returns a copy with current and real power scaled by `factor`.
    ///
    /// Calibration applies to the two measured channels only; derived fields
    /// (apparent/reactive power) keep the backend's values.
    pub fn calibrated(mut self, factor: f64) -> Self {
        self.current *= factor;
        self.real_power *= factor;
        self
    }

    /// Derives reactive power from apparent and real power.
    ///
    /// `sqrt(apparent^2 - real^2)`, clamped to 0 when rounding drives the
    /// difference negative.
    pub fn reactive_power_of(apparent: f64, real: f64) -> f64 {
        (apparent * apparent - real * real).max(0.0).sqrt()
    }
}
