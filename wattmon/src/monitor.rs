//! Telemetry orchestrator: sampling, energy accounting, and rollups.
//!
//! [`PowerMonitor`] ties the subsystems together: it owns the [`Sampler`],
//! the [`TariffEngine`], and one lock over the energy ledger plus the daily
//! aggregator. Every energy record enters through
//! [`add_energy_reading`](PowerMonitor::add_energy_reading), which stamps,
//! costs, appends, and buckets under a single lock acquisition.
//!
//! Queries never fail. Absent data reads back as zero-valued structs, and
//! only startup and CSV export return errors.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Days, Local, Timelike};

use crate::config::{MonitorConfig, TariffConfig};
use crate::daily::{DailyAggregator, DayStats, MonthStats, WeekStats, date_key};
use crate::error::Result;
use crate::export;
use crate::ledger::{EnergyRecord, HistoryLedger};
use crate::reading::Reading;
use crate::sampler::{Sampler, SamplerState, ThresholdHook};
use crate::source::SourceKind;
use crate::tariff::TariffEngine;
use crate::thermal::ThermalProbe;
use crate::window::WindowStats;

/// Grid emission factor, kg CO2 per kWh.
const CO2_KG_PER_KWH: f64 = 0.33;

/// Ledger and aggregator share one lock: a record lands in both or neither.
#[derive(Default)]
struct Accounting {
    ledger: HistoryLedger,
    daily: DailyAggregator,
}

/// Device-level telemetry controller.
pub struct PowerMonitor {
    sampler: Sampler,
    tariff: Arc<TariffEngine>,
    accounting: Mutex<Accounting>,
    thermal: Mutex<ThermalProbe>,
    enabled: bool,
    critical_threshold: f64,
}

impl PowerMonitor {
    /// Builds a monitor from validated configuration.
    ///
    /// Nothing is sampled until [`start`](PowerMonitor::start).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) when the
    /// configuration fails validation.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sampler: Sampler::new(&config.sensor),
            tariff: Arc::new(TariffEngine::new(config.tariff)?),
            accounting: Mutex::new(Accounting::default()),
            thermal: Mutex::new(ThermalProbe::new()),
            enabled: config.sensor.enabled,
            critical_threshold: config.sensor.critical_threshold,
        })
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Starts the sampling thread.
    ///
    /// A configuration with the sensor disabled is not an error: the monitor
    /// stays idle and reports `"disabled"`.
    ///
    /// # Errors
    ///
    /// Propagates sampler startup failures.
    pub fn start(&mut self) -> Result<()> {
        if !self.enabled {
            tracing::info!("sensor disabled by configuration, sampler not started");
            return Ok(());
        }
        self.sampler.start()
    }

    /// Stops sampling and freezes the reading snapshot.
    pub fn stop(&mut self) {
        self.sampler.stop();
    }

    /// Sampler lifecycle state.
    pub fn state(&self) -> SamplerState {
        self.sampler.state()
    }

    /// Kind of the source actually sampling (after any fallback).
    pub fn source_kind(&self) -> SourceKind {
        self.sampler.source_kind()
    }

    /// Coarse sensor status: `"disabled"`, `"no_data"`, `"idle"`, or
    /// `"active"`.
    pub fn status(&self) -> &'static str {
        if !self.enabled {
            return "disabled";
        }
        let last = self.sampler.last_valid_reading();
        if last.timestamp_millis == 0 {
            return "no_data";
        }
        if last.voltage == 0.0 && last.current == 0.0 {
            return "idle";
        }
        "active"
    }

    // ── Sampler passthrough ─────────────────────────────────────────

    /// Most recently published reading, valid or not.
    pub fn current_reading(&self) -> Reading {
        self.sampler.current_reading()
    }

    /// Most recent reading that passed validity checks.
    pub fn last_valid_reading(&self) -> Reading {
        self.sampler.last_valid_reading()
    }

    /// Power statistics over the trailing `seconds` of the rolling window.
    pub fn window_stats(&self, seconds: usize) -> WindowStats {
        self.sampler.window_stats(seconds)
    }

    /// Adjusts the synthetic source's constant load.
    pub fn set_simulated_load(&self, watts: f64) {
        self.sampler.set_simulated_load(watts);
    }

    /// Zeroes the cumulative energy on both published readings.
    pub fn reset_energy(&self) {
        self.sampler.reset_energy();
    }

    /// Installs the power threshold callback.
    pub fn on_threshold(&self, hook: ThresholdHook) {
        self.sampler.on_threshold(hook);
    }

    /// Replaces the warning/critical power thresholds (watts).
    pub fn set_power_thresholds(&mut self, warning: f64, critical: f64) {
        self.sampler.set_power_thresholds(warning, critical);
        self.critical_threshold = critical;
    }

    // ── Energy accounting ───────────────────────────────────────────

    /// Records an energy delta: the single mutation path into the ledger
    /// and the daily buckets.
    ///
    /// The record is stamped with the current local time and costed at the
    /// current local hour's tariff. Non-positive or non-finite energy is
    /// ignored.
    pub fn add_energy_reading(&self, energy_kwh: f64) {
        if energy_kwh <= 0.0 || !energy_kwh.is_finite() {
            return;
        }

        let now = Local::now();
        let hour = now.hour();
        let cost = self.tariff.cost(energy_kwh, hour);
        let peak = self.tariff.is_peak(hour);
        let record = EnergyRecord {
            timestamp_seconds: now.timestamp(),
            energy_kwh,
            cost,
        };

        let mut accounting = self.lock_accounting();
        accounting.ledger.append(record);
        accounting
            .daily
            .ingest(&date_key(now.date_naive()), energy_kwh, cost, peak);
    }

    /// Converts sustained power draw into an energy record.
    ///
    /// `energy = watts x duration / 3_600_000`. A non-positive power or
    /// duration is a no-op.
    pub fn add_power_reading(&self, watts: f64, duration_seconds: f64) {
        if watts <= 0.0 || duration_seconds <= 0.0 {
            return;
        }
        self.add_energy_reading(watts * duration_seconds / 3_600_000.0);
    }

    // ── Rollups ─────────────────────────────────────────────────────

    /// Today's rollup (local calendar date).
    pub fn today(&self) -> DayStats {
        let date = Local::now().date_naive();
        self.lock_accounting().daily.day(&date_key(date))
    }

    /// Yesterday's rollup.
    pub fn yesterday(&self) -> DayStats {
        let Some(date) = Local::now().date_naive().checked_sub_days(Days::new(1)) else {
            return DayStats::default();
        };
        self.lock_accounting().daily.day(&date_key(date))
    }

    /// Rollup over the last 7 local calendar days, today inclusive.
    pub fn week(&self) -> WeekStats {
        self.lock_accounting().daily.week(Local::now().date_naive())
    }

    /// Rollup over the current local calendar month.
    pub fn month(&self) -> MonthStats {
        self.lock_accounting()
            .daily
            .month(Local::now().date_naive())
    }

    /// Most recent energy record, zero-valued when none exist.
    pub fn latest(&self) -> EnergyRecord {
        self.lock_accounting().ledger.latest()
    }

    /// Energy records from the trailing `hours`, oldest first.
    pub fn history(&self, hours: u32) -> Vec<EnergyRecord> {
        self.lock_accounting()
            .ledger
            .history(hours, Local::now().timestamp())
    }

    /// Drops every energy record.
    pub fn clear_history(&self) {
        self.lock_accounting().ledger.clear();
        tracing::info!("energy history cleared");
    }

    /// Drops every daily bucket.
    pub fn clear_daily_stats(&self) {
        self.lock_accounting().daily.clear();
        tracing::info!("daily statistics cleared");
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Writes the daily buckets as CSV.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`](crate::error::StorageError) when the file
    /// cannot be created or written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let accounting = self.lock_accounting();
        export::write_daily_csv(path, &accounting.daily)
    }

    /// Combined JSON report: today, week, and month rollups plus a
    /// generation timestamp in epoch seconds.
    pub fn json_report(&self) -> serde_json::Value {
        let (today, week, month) = {
            let accounting = self.lock_accounting();
            let date = Local::now().date_naive();
            (
                accounting.daily.day(&date_key(date)),
                accounting.daily.week(date),
                accounting.daily.month(date),
            )
        };

        serde_json::json!({
            "today": today,
            "week": week,
            "month": month,
            "timestamp": Local::now().timestamp(),
        })
    }

    /// Instantaneous statistics as a map of named values.
    ///
    /// Combines the current reading, window statistics over
    /// `period_seconds`, and the CPU temperature. `load_percentage` is the
    /// current power relative to the critical threshold, 0 when no voltage
    /// is present or the threshold is 0.
    pub fn statistics(&self, period_seconds: usize) -> BTreeMap<&'static str, f64> {
        let reading = self.sampler.current_reading();
        let window = self.sampler.window_stats(period_seconds);
        let temperature = self
            .thermal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .celsius();

        let load_percentage = if reading.voltage > 0.0 && self.critical_threshold > 0.0 {
            reading.real_power / self.critical_threshold * 100.0
        } else {
            0.0
        };

        BTreeMap::from([
            ("voltage", reading.voltage),
            ("current", reading.current),
            ("power", reading.real_power),
            ("power_apparent", reading.apparent_power),
            ("power_reactive", reading.reactive_power),
            ("power_factor", reading.power_factor),
            ("frequency", reading.frequency),
            ("energy", reading.cumulative_energy),
            ("temperature", temperature),
            ("power_avg", window.average),
            ("power_max", window.max),
            ("power_min", window.min),
            ("load_percentage", load_percentage),
        ])
    }

    // ── Tariff ──────────────────────────────────────────────────────

    /// Currently active tariff schedule.
    pub fn tariff_schedule(&self) -> TariffConfig {
        self.tariff.schedule()
    }

    /// Replaces the per-kWh rates.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite rates; the prior rates stay active.
    pub fn set_tariff_rates(&self, peak: f64, offpeak: f64) -> Result<()> {
        self.tariff.set_rates(peak, offpeak)
    }

    /// Replaces the peak window `[start, end)`.
    ///
    /// # Errors
    ///
    /// Rejects `start >= end` and hours past 23; the prior window stays
    /// active.
    pub fn set_peak_window(&self, start: u32, end: u32) -> Result<()> {
        self.tariff.set_peak_window(start, end)
    }

    // ── Estimates ───────────────────────────────────────────────────

    /// Estimated CO2 emissions in kg for `energy_kwh`.
    pub fn co2_emissions(&self, energy_kwh: f64) -> f64 {
        energy_kwh * CO2_KG_PER_KWH
    }

    /// Estimated cost of `energy_kwh_saved` at the mean of the two rates.
    pub fn estimated_savings(&self, energy_kwh_saved: f64) -> f64 {
        energy_kwh_saved * self.tariff.average_rate()
    }

    // A poisoned lock still holds consistent accounting; recover the guard.
    fn lock_accounting(&self) -> MutexGuard<'_, Accounting> {
        self.accounting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorConfig;

    fn monitor() -> PowerMonitor {
        PowerMonitor::new(&MonitorConfig::default()).unwrap()
    }

    #[test]
    fn test_fresh_monitor_reports_no_data() {
        let m = monitor();
        assert_eq!(m.state(), SamplerState::Idle);
        assert_eq!(m.status(), "no_data");
        assert_eq!(m.latest(), EnergyRecord::default());
        assert_eq!(m.today(), DayStats::default());
    }

    #[test]
    fn test_disabled_sensor_never_starts() {
        let config = MonitorConfig {
            sensor: SensorConfig {
                enabled: false,
                ..SensorConfig::default()
            },
            ..MonitorConfig::default()
        };

        let mut m = PowerMonitor::new(&config).unwrap();
        m.start().unwrap();
        assert_eq!(m.state(), SamplerState::Idle);
        assert_eq!(m.status(), "disabled");
    }

    #[test]
    fn test_power_reading_converts_to_energy() {
        let m = monitor();
        m.add_power_reading(1200.0, 60.0);

        let latest = m.latest();
        assert!((latest.energy_kwh - 0.02).abs() < 1e-12);
        assert!((m.today().energy_total - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_power_readings_are_noops() {
        let m = monitor();
        m.add_power_reading(0.0, 60.0);
        m.add_power_reading(100.0, 0.0);
        m.add_power_reading(-5.0, 60.0);
        m.add_power_reading(100.0, -1.0);

        assert_eq!(m.latest(), EnergyRecord::default());
        assert_eq!(m.today().energy_total, 0.0);
    }

    #[test]
    fn test_energy_reading_costed_at_a_configured_rate() {
        let m = monitor();
        m.add_energy_reading(1.0);

        // The record was costed at whichever rate the current hour selects.
        let latest = m.latest();
        let schedule = m.tariff_schedule();
        let rate = latest.cost / latest.energy_kwh;
        assert!(
            (rate - schedule.peak).abs() < 1e-9 || (rate - schedule.offpeak).abs() < 1e-9,
            "rate {rate} matches neither tariff"
        );
    }

    #[test]
    fn test_history_returns_fresh_records_in_order() {
        let m = monitor();
        m.add_energy_reading(0.1);
        m.add_energy_reading(0.2);

        let history = m.history(1);
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp_seconds <= history[1].timestamp_seconds);
        assert!((history[0].energy_kwh - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_clear_operations() {
        let m = monitor();
        m.add_energy_reading(0.5);

        m.clear_history();
        assert_eq!(m.latest(), EnergyRecord::default());
        // Daily buckets survive a history clear.
        assert!(m.today().energy_total > 0.0);

        m.clear_daily_stats();
        assert_eq!(m.today().energy_total, 0.0);
    }

    #[test]
    fn test_json_report_shape() {
        let m = monitor();
        m.add_energy_reading(0.3);

        let report = m.json_report();
        assert!(report["today"]["energy_total"].as_f64().unwrap() > 0.0);
        assert!(report["week"]["days_count"].as_u64().unwrap() >= 1);
        assert!(report["month"].is_object());
        assert!(report["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_week_report_omits_averages_when_empty() {
        let m = monitor();
        let report = m.json_report();

        assert_eq!(report["week"]["days_count"].as_u64(), Some(0));
        assert!(report["week"].get("energy_daily_avg").is_none());
        assert!(report["week"].get("cost_daily_avg").is_none());
    }

    #[test]
    fn test_statistics_map_has_every_key() {
        let m = monitor();
        let stats = m.statistics(60);

        for key in [
            "voltage",
            "current",
            "power",
            "power_apparent",
            "power_reactive",
            "power_factor",
            "frequency",
            "energy",
            "temperature",
            "power_avg",
            "power_max",
            "power_min",
            "load_percentage",
        ] {
            assert!(stats.contains_key(key), "missing {key}");
        }
        // No voltage sampled yet, so the load reads 0.
        assert_eq!(stats["load_percentage"], 0.0);
    }

    #[test]
    fn test_zero_critical_threshold_reads_zero_load() {
        let config = MonitorConfig {
            sensor: SensorConfig {
                warning_threshold: 0.0,
                critical_threshold: 0.0,
                ..SensorConfig::default()
            },
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_ok());

        let mut m = PowerMonitor::new(&config).unwrap();
        m.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(450));
        m.stop();

        // Live voltage with a zero threshold must not divide through it.
        let stats = m.statistics(60);
        assert!(stats["voltage"] > 0.0);
        assert_eq!(stats["load_percentage"], 0.0);
    }

    #[test]
    fn test_estimates() {
        let m = monitor();
        assert!((m.co2_emissions(10.0) - 3.3).abs() < 1e-9);
        // Default rates 5.0 / 2.0 average to 3.5.
        assert!((m.estimated_savings(10.0) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_tariff_updates_reject_invalid_and_keep_prior() {
        let m = monitor();
        assert!(m.set_peak_window(23, 8).is_err());
        assert_eq!(m.tariff_schedule().peak_start, 8);

        m.set_peak_window(7, 22).unwrap();
        assert_eq!(m.tariff_schedule().peak_start, 7);
        assert_eq!(m.tariff_schedule().peak_end, 22);

        assert!(m.set_tariff_rates(-1.0, 2.0).is_err());
        assert_eq!(m.tariff_schedule().peak, 5.0);
    }

    #[test]
    fn test_monitor_becomes_active_after_sampling() {
        let mut m = monitor();
        m.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(450));
        m.stop();

        assert_eq!(m.status(), "active");
        assert_eq!(m.source_kind(), SourceKind::Synthetic);
        assert!(m.current_reading().is_valid());
        assert_eq!(m.state(), SamplerState::Stopped);
    }

    #[test]
    fn test_reset_energy_passthrough() {
        let mut m = monitor();
        m.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(350));
        m.stop();

        m.reset_energy();
        assert_eq!(m.current_reading().cumulative_energy, 0.0);
        assert_eq!(m.last_valid_reading().cumulative_energy, 0.0);
    }
}
