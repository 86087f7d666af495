//! Peak/off-peak tariff engine.
//!
//! Cost is a pure function of an energy delta and a local hour:
//! `energy * (is_peak(hour) ? peak : offpeak)`. The peak window is half-open
//! on the 24-hour domain, `hour ∈ [peak_start, peak_end)`; wrap-around
//! windows are not supported and are rejected at configuration time, keeping
//! the prior window active.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::TariffConfig;
use crate::error::Result;

/// Maps (energy, local hour) to a cost under the configured schedule.
///
/// Rates and the peak window are mutable configuration guarded by the
/// engine's own lock: they are read on every ledger append and written by
/// external configuration updates.
pub struct TariffEngine {
    schedule: Mutex<TariffConfig>,
}

impl TariffEngine {
    /// Creates an engine with a validated schedule.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError`] when the schedule is invalid.
    pub fn new(config: TariffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            schedule: Mutex::new(config),
        })
    }

    /// A poisoned lock still holds a valid schedule; recover the guard.
    fn lock(&self) -> MutexGuard<'_, TariffConfig> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the active schedule.
    pub fn schedule(&self) -> TariffConfig {
        *self.lock()
    }

    /// True when `hour` falls inside the half-open peak window.
    pub fn is_peak(&self, hour: u32) -> bool {
        let schedule = self.lock();
        hour >= schedule.peak_start && hour < schedule.peak_end
    }

    /// Cost of `energy_kwh` consumed during local `hour`.
    pub fn cost(&self, energy_kwh: f64, hour: u32) -> f64 {
        let schedule = self.lock();
        let rate = if hour >= schedule.peak_start && hour < schedule.peak_end {
            schedule.peak
        } else {
            schedule.offpeak
        };
        energy_kwh * rate
    }

    /// Mean of the two rates, used for savings estimates.
    pub fn average_rate(&self) -> f64 {
        let schedule = self.lock();
        (schedule.peak + schedule.offpeak) / 2.0
    }

    /// Replaces the rates, keeping the prior schedule on rejection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::InvalidRate`] for negative or
    /// non-finite rates.
    pub fn set_rates(&self, peak: f64, offpeak: f64) -> Result<()> {
        let mut guard = self.lock();
        let candidate = TariffConfig {
            peak,
            offpeak,
            ..*guard
        };
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }

    /// Replaces the peak window, keeping the prior schedule on rejection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::InvalidPeakWindow`] when
    /// `start >= end` or either hour is outside 0..=23.
    pub fn set_peak_window(&self, start: u32, end: u32) -> Result<()> {
        let mut guard = self.lock();
        let candidate = TariffConfig {
            peak_start: start,
            peak_end: end,
            ..*guard
        };
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}

impl Default for TariffEngine {
    fn default() -> Self {
        Self {
            schedule: Mutex::new(TariffConfig::default()),
        }
    }
}
