//! Error types for the wattmon telemetry engine.

use thiserror::Error;

/// The main error type for all wattmon operations.
///
/// This enum covers the fallible surfaces of the engine: sensor backend
/// construction, configuration updates, and flat-file export. Queries never
/// produce errors; absent data is reported as zero-valued results.
#[derive(Error, Debug)]
pub enum WattmonError {
    /// Error constructing or reading a sensor backend.
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Error validating or loading configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error writing exported statistics to disk.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors that can occur when constructing or reading a sensor backend.
///
/// Init and unsupported-backend failures are recoverable: the sampler logs a
/// warning and falls back to the synthetic source, so they never reach the
/// caller of `Sampler::start`. Read failures leave the last-valid reading in
/// place.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The backend exists but could not be brought up.
    #[error("failed to initialize '{kind}' sensor backend: {reason}")]
    InitFailed {
        /// The configured backend kind.
        kind: String,
        /// Description of what went wrong during bring-up.
        reason: String,
    },

    /// The backend is recognized but has no implementation on this build.
    #[error("sensor backend '{kind}' is not supported")]
    Unsupported {
        /// The configured backend kind.
        kind: String,
    },

    /// A single sample could not be read from the backend.
    #[error("sensor read failed: {reason}")]
    Read {
        /// Description of the transient failure.
        reason: String,
    },
}

/// Errors that can occur during configuration validation or loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The peak-hour window is not a valid half-open interval.
    ///
    /// Wrap-around windows (start >= end) are not supported; the prior
    /// valid window stays active when this is returned.
    #[error("invalid peak window [{start}, {end}): start must be below end, both within 0..=23")]
    InvalidPeakWindow {
        /// The rejected start hour.
        start: u32,
        /// The rejected end hour (exclusive bound).
        end: u32,
    },

    /// The calibration factor must be positive.
    #[error("invalid calibration factor {factor}: must be > 0")]
    InvalidCalibration {
        /// The rejected factor.
        factor: f64,
    },

    /// A tariff rate must be non-negative.
    #[error("invalid tariff rate {rate}: must be >= 0")]
    InvalidRate {
        /// The rejected rate.
        rate: f64,
    },

    /// Power thresholds must be non-negative with warning below critical.
    #[error("invalid power thresholds: warning {warning} W, critical {critical} W")]
    InvalidThresholds {
        /// The rejected warning threshold in watts.
        warning: f64,
        /// The rejected critical threshold in watts.
        critical: f64,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// The config file path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be parsed as JSON.
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: std::path::PathBuf,
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while writing exported statistics to disk.
///
/// Export is a fallible surface: a failed export returns this error and
/// guarantees nothing about partial file contents.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The export file could not be created.
    #[error("failed to create export file '{}': {source}", path.display())]
    Create {
        /// The export file path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a row to the export file failed.
    #[error("failed to write export file '{}': {source}", path.display())]
    Write {
        /// The export file path.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for `Result<T, WattmonError>`.
pub type Result<T> = std::result::Result<T, WattmonError>;
