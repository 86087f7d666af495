//! Sampling backends for the telemetry engine.
//!
//! A [`SampleSource`] produces one [`Reading`] per tick. The engine ships one
//! working backend, the synthetic generator, plus placeholders for the real
//! sensor kinds a deployment would select in configuration. Real kinds report
//! [`SensorError::Unsupported`] from the builder so the sampler's fallback to
//! the synthetic source stays visible and testable instead of silently
//! swallowing a bring-up failure.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use crate::reading::Reading;

/// Identifies a sampling backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// I2C power sensor on the system bus (INA219-class).
    I2c,
    /// Analog front-end behind an ADC.
    Analog,
    /// PZEM-004T serial energy meter.
    Pzem,
    /// Synthetic generator for development, tests, and hardware fallback.
    Synthetic,
}

impl SourceKind {
    /// Returns the lowercase name used in configuration files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::I2c => "i2c",
            SourceKind::Analog => "analog",
            SourceKind::Pzem => "pzem",
            SourceKind::Synthetic => "synthetic",
        }
    }

    /// True for backends that talk to hardware.
    pub fn is_real(self) -> bool {
        !matches!(self, SourceKind::Synthetic)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sampling backend: produces one telemetry reading per tick.
///
/// Implementations run on the sampler's background thread and must be `Send`.
/// A failed read is transient: the sampler keeps the last-valid reading and
/// tries again next tick.
pub trait SampleSource: Send {
    /// The backend kind this source implements.
    fn kind(&self) -> SourceKind;

    /// Produces the next reading.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Read`] when a single sample cannot be taken.
    fn next_reading(&mut self) -> Result<Reading, SensorError>;
}

/// Shared handle to the synthetic generator's load setpoint in watts.
///
/// The sampler keeps one clone and the generator (running on the background
/// thread) keeps the other; updates are a single atomic store of the f64
/// bits.
#[derive(Debug, Clone)]
pub struct SimulatedLoad(Arc<AtomicU64>);

impl SimulatedLoad {
    /// Default setpoint for a freshly built generator.
    pub const DEFAULT_WATTS: f64 = 100.0;

    /// Creates a handle with the given setpoint.
    pub fn new(watts: f64) -> Self {
        Self(Arc::new(AtomicU64::new(watts.to_bits())))
    }

    /// Replaces the setpoint.
    pub fn set(&self, watts: f64) {
        self.0.store(watts.to_bits(), Ordering::Relaxed);
    }

    /// Reads the current setpoint.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl Default for SimulatedLoad {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WATTS)
    }
}

/// Synthetic telemetry generator.
///
/// Models a resistive load on a nominally 220 V line: voltage is drawn from
/// U(215, 230) V, frequency from U(49.8, 50.2) Hz, and the power factor from
/// U(0.85, 0.99). Real power equals the load setpoint, current follows from
/// the sampled voltage, and the energy accumulator integrates the setpoint
/// over wall time between calls.
pub struct SyntheticSource {
    /// Load setpoint handle shared with the sampler.
    load: SimulatedLoad,
    /// Accumulated energy in kWh since construction.
    energy_kwh: f64,
    /// Monotonic time of the previous sample, None before the first call.
    last_sample: Option<Instant>,
    rng: StdRng,
}

impl SyntheticSource {
    /// Creates a generator bound to the given load handle.
    pub fn new(load: SimulatedLoad) -> Self {
        Self {
            load,
            energy_kwh: 0.0,
            last_sample: None,
            rng: StdRng::from_entropy(),
        }
    }
}

impl SampleSource for SyntheticSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Synthetic
    }

    fn next_reading(&mut self) -> Result<Reading, SensorError> {
        let now = Instant::now();
        let delta_hours = self
            .last_sample
            .map_or(0.0, |t| now.duration_since(t).as_secs_f64() / 3600.0);
        self.last_sample = Some(now);

        let load = self.load.get();
        self.energy_kwh += load * delta_hours / 1000.0;

        let voltage = self.rng.gen_range(215.0..230.0);
        let current = load / voltage;
        let apparent_power = voltage * current;

        Ok(Reading {
            voltage,
            current,
            real_power: load,
            apparent_power,
            reactive_power: Reading::reactive_power_of(apparent_power, load),
            power_factor: self.rng.gen_range(0.85..0.99),
            frequency: self.rng.gen_range(49.8..50.2),
            cumulative_energy: self.energy_kwh,
            timestamp_millis: unix_millis(),
        })
    }
}

/// Builds the source for a configured backend kind.
///
/// The synthetic kind always succeeds. Real kinds have no driver in this
/// build and return [`SensorError::Unsupported`]; the sampler logs the error
/// and retries with the synthetic source.
///
/// # Errors
///
/// Returns [`SensorError::Unsupported`] for `I2c`, `Analog`, and `Pzem`.
pub fn build_source(
    kind: SourceKind,
    load: SimulatedLoad,
) -> Result<Box<dyn SampleSource>, SensorError> {
    match kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticSource::new(load))),
        real => Err(SensorError::Unsupported {
            kind: real.to_string(),
        }),
    }
}

/// Returns current wall-clock time as milliseconds since epoch.
pub(crate) fn unix_millis() -> u64 {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    dur.as_secs() * 1000 + u64::from(dur.subsec_millis())
}
