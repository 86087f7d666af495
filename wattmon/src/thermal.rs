//! CPU temperature from the kernel thermal zone.
//!
//! The zone file holds millidegrees Celsius as ASCII. Reads are cheap but
//! the value moves slowly, so the probe caches the last reading and
//! refreshes at most once per [`REFRESH_INTERVAL`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Minimum time between two reads of the zone file.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Parses a thermal zone file, millidegrees to degrees Celsius.
///
/// Returns `None` when the file is absent or malformed (containers,
/// non-ARM boards).
fn read_zone_celsius(path: &Path) -> Option<f64> {
    let raw = fs::read_to_string(path).ok()?;
    let millidegrees: f64 = raw.trim().parse().ok()?;
    Some(millidegrees / 1000.0)
}

/// Cached CPU temperature probe.
///
/// Starts at 0.0 and keeps the previous reading whenever the zone file
/// cannot be read, so callers always get a number.
#[derive(Debug)]
pub struct ThermalProbe {
    path: PathBuf,
    cached: f64,
    refreshed_at: Option<Instant>,
}

impl ThermalProbe {
    /// Probe over the default thermal zone.
    pub fn new() -> Self {
        Self::with_path(THERMAL_ZONE)
    }

    /// Probe over an explicit zone file path.
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cached: 0.0,
            refreshed_at: None,
        }
    }

    /// Current CPU temperature in degrees Celsius.
    ///
    /// Re-reads the zone file only when the cached value is older than
    /// [`REFRESH_INTERVAL`].
    pub fn celsius(&mut self) -> f64 {
        let stale = self
            .refreshed_at
            .is_none_or(|at| at.elapsed() >= REFRESH_INTERVAL);
        if stale {
            if let Some(degrees) = read_zone_celsius(&self.path) {
                self.cached = degrees;
            }
            self.refreshed_at = Some(Instant::now());
        }
        self.cached
    }
}

impl Default for ThermalProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_millidegrees_as_celsius() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("temp");
        fs::write(&zone, "45230\n").unwrap();

        let mut probe = ThermalProbe::with_path(&zone);
        assert!((probe.celsius() - 45.23).abs() < 1e-9);
    }

    #[test]
    fn test_missing_zone_reads_zero() {
        let mut probe = ThermalProbe::with_path("/nonexistent/thermal/zone");
        assert_eq!(probe.celsius(), 0.0);
    }

    #[test]
    fn test_malformed_zone_keeps_prior_value() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("temp");
        fs::write(&zone, "garbage").unwrap();

        let mut probe = ThermalProbe::with_path(&zone);
        assert_eq!(probe.celsius(), 0.0);
    }

    #[test]
    fn test_reading_is_cached_between_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("temp");
        fs::write(&zone, "40000").unwrap();

        let mut probe = ThermalProbe::with_path(&zone);
        assert_eq!(probe.celsius(), 40.0);

        // A fresh value lands on disk but the cache is still warm.
        fs::write(&zone, "80000").unwrap();
        assert_eq!(probe.celsius(), 40.0);
    }
}
