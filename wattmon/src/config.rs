//! Configuration types for the telemetry engine.
//!
//! Configuration is a JSON document deserialized with serde. Every field has
//! a default, so `{}` is a complete valid configuration. Components receive
//! these structs by value at construction; there is no global configuration
//! instance.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::source::SourceKind;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sensor backend, calibration, and threshold settings.
    pub sensor: SensorConfig,
    /// Tariff rates and the peak-hour window.
    pub tariff: TariffConfig,
}

/// Sensor backend selection and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Backend selector. Real kinds fall back to synthetic when unsupported.
    pub kind: SourceKind,
    /// Bus number for real backends; ignored by the synthetic generator.
    pub bus: u32,
    /// Device address for real backends.
    pub address: u32,
    /// Multiplier applied to every measured current and power value.
    pub calibration: f64,
    /// Warning power threshold in watts for best-effort callbacks.
    pub warning_threshold: f64,
    /// Critical power threshold in watts, checked before the warning one.
    pub critical_threshold: f64,
    /// Master enable. When false the sampler is never started and the
    /// monitor reports the "disabled" status.
    pub enabled: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            bus: 1,
            address: 0x40,
            calibration: 1.0,
            warning_threshold: 2000.0,
            critical_threshold: 3000.0,
            enabled: true,
        }
    }
}

/// Tariff rates and the half-open peak-hour window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Rate per kWh inside the peak window.
    pub peak: f64,
    /// Rate per kWh outside the peak window.
    pub offpeak: f64,
    /// First peak hour, inclusive, 0..=23.
    pub peak_start: u32,
    /// End of the peak window, exclusive, 0..=23. Must be above
    /// `peak_start`; wrap-around windows are not supported.
    pub peak_end: u32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            peak: 5.0,
            offpeak: 2.0,
            peak_start: 8,
            peak_end: 23,
        }
    }
}

impl TariffConfig {
    /// Validates the rates and the peak window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPeakWindow`] for a wrap-around or
    /// out-of-range window and [`ConfigError::InvalidRate`] for negative
    /// rates.
    pub fn validate(&self) -> Result<()> {
        if self.peak_start >= self.peak_end || self.peak_end > 23 {
            return Err(ConfigError::InvalidPeakWindow {
                start: self.peak_start,
                end: self.peak_end,
            }
            .into());
        }
        for rate in [self.peak, self.offpeak] {
            if rate < 0.0 || !rate.is_finite() {
                return Err(ConfigError::InvalidRate { rate }.into());
            }
        }
        Ok(())
    }
}

impl MonitorConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] when the file cannot be read,
    /// [`ConfigError::Parse`] for malformed JSON, and the validation errors
    /// of [`MonitorConfig::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: MonitorConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered: invalid calibration,
    /// thresholds, rates, or peak window.
    pub fn validate(&self) -> Result<()> {
        if self.sensor.calibration <= 0.0 || !self.sensor.calibration.is_finite() {
            return Err(ConfigError::InvalidCalibration {
                factor: self.sensor.calibration,
            }
            .into());
        }

        let (warning, critical) = (
            self.sensor.warning_threshold,
            self.sensor.critical_threshold,
        );
        if !warning.is_finite()
            || !critical.is_finite()
            || warning < 0.0
            || critical < 0.0
            || warning > critical
        {
            return Err(ConfigError::InvalidThresholds { warning, critical }.into());
        }

        self.tariff.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_full_default() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.sensor.kind, SourceKind::Synthetic);
        assert_eq!(config.sensor.bus, 1);
        assert_eq!(config.sensor.address, 0x40);
        assert_eq!(config.sensor.calibration, 1.0);
        assert_eq!(config.sensor.warning_threshold, 2000.0);
        assert_eq!(config.sensor.critical_threshold, 3000.0);
        assert!(config.sensor.enabled);
        assert_eq!(config.tariff.peak, 5.0);
        assert_eq!(config.tariff.offpeak, 2.0);
        assert_eq!(config.tariff.peak_start, 8);
        assert_eq!(config.tariff.peak_end, 23);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_overrides() {
        let json = r#"{
            "sensor": { "kind": "i2c", "calibration": 1.02 },
            "tariff": { "peak": 6.5 }
        }"#;
        let config: MonitorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.sensor.kind, SourceKind::I2c);
        assert_eq!(config.sensor.calibration, 1.02);
        assert_eq!(config.sensor.bus, 1);
        assert_eq!(config.tariff.peak, 6.5);
        assert_eq!(config.tariff.offpeak, 2.0);
    }

    #[test]
    fn test_wraparound_peak_window_rejected() {
        let config = MonitorConfig {
            tariff: TariffConfig {
                peak_start: 23,
                peak_end: 8,
                ..TariffConfig::default()
            },
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            tariff: TariffConfig {
                peak_start: 8,
                peak_end: 8,
                ..TariffConfig::default()
            },
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_calibration_rejected() {
        let mut config = MonitorConfig::default();
        config.sensor.calibration = 0.0;
        assert!(config.validate().is_err());

        config.sensor.calibration = -2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_warning_above_critical_rejected() {
        let mut config = MonitorConfig::default();
        config.sensor.warning_threshold = 3500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_thresholds_rejected() {
        // NaN compares false against every bound, so it needs its own check.
        let mut config = MonitorConfig::default();
        config.sensor.warning_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.sensor.critical_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.sensor.warning_threshold = f64::INFINITY;
        config.sensor.critical_threshold = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");

        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{ "sensor": {{ "kind": "pzem", "bus": 2 }} }}"#).unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.sensor.kind, SourceKind::Pzem);
        assert_eq!(config.sensor.bus, 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = MonitorConfig::load(dir.path().join("absent.json"));
        assert!(result.is_err());
    }
}
