//! Controller service: owns the monitor and drives the accounting loop.
//!
//! The service wires command-line settings to a [`PowerMonitor`]: it loads
//! the JSON configuration, installs a threshold hook that logs through
//! `tracing`, folds sampled power into the energy ledger at a fixed
//! interval, and runs the shutdown export/report sequence.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use wattmon::{MonitorConfig, PowerMonitor};

/// Runtime settings assembled from the command line.
pub struct Settings {
    /// JSON configuration file; `None` runs on defaults.
    pub config_path: Option<PathBuf>,
    /// Orderly-shutdown deadline; `None` runs until killed.
    pub run_for: Option<Duration>,
    /// Daily CSV destination written on shutdown.
    pub export_path: Option<PathBuf>,
    /// Gap between energy accounting pushes.
    pub push_interval: Duration,
}

/// The daemon runtime: a monitor plus the accounting loop around it.
pub struct Service {
    monitor: PowerMonitor,
    settings: Settings,
}

impl Service {
    /// Loads configuration and builds the monitor with its threshold hook.
    ///
    /// # Errors
    ///
    /// Returns file read, parse, or validation errors from the
    /// configuration path.
    pub fn new(settings: Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &settings.config_path {
            Some(path) => {
                tracing::info!("loading configuration from {}", path.display());
                MonitorConfig::load(path)?
            }
            None => MonitorConfig::default(),
        };

        let critical = config.sensor.critical_threshold;
        let monitor = PowerMonitor::new(&config)?;

        // The hook receives (power, threshold); the threshold value tells
        // warning and critical apart.
        monitor.on_threshold(Arc::new(move |power, threshold| {
            if threshold >= critical {
                tracing::error!(
                    "critical power threshold exceeded: {power:.1} W >= {threshold:.1} W"
                );
            } else {
                tracing::warn!("power threshold exceeded: {power:.1} W >= {threshold:.1} W");
            }
        }));

        Ok(Self { monitor, settings })
    }

    /// Runs the accounting loop until the deadline, then shuts down.
    ///
    /// # Errors
    ///
    /// Returns sampler start errors and shutdown export or serialization
    /// errors.
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let schedule = self.monitor.tariff_schedule();
        tracing::info!(
            "tariff peak [{:02}:00, {:02}:00) at {}/kWh, off-peak {}/kWh",
            schedule.peak_start,
            schedule.peak_end,
            schedule.peak,
            schedule.offpeak
        );

        self.monitor.start()?;
        tracing::info!(
            "accounting {} backend power every {:?}",
            self.monitor.source_kind(),
            self.settings.push_interval
        );

        let started = Instant::now();
        loop {
            let sleep_for = match self.settings.run_for {
                Some(limit) => {
                    let remaining = limit.saturating_sub(started.elapsed());
                    if remaining.is_zero() {
                        break;
                    }
                    // The last interval shrinks so the deadline is not
                    // overshot.
                    remaining.min(self.settings.push_interval)
                }
                None => self.settings.push_interval,
            };

            std::thread::sleep(sleep_for);

            let power = self.monitor.last_valid_reading().real_power;
            self.monitor
                .add_power_reading(power, sleep_for.as_secs_f64());
            tracing::debug!("accounted {power:.1} W over {sleep_for:?}");
        }

        self.shutdown()
    }

    /// Stops sampling, exports the CSV when requested, prints the report.
    fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.monitor.stop();

        if let Some(path) = &self.settings.export_path {
            self.monitor.export_csv(path)?;
        }

        let report = self.monitor.json_report();
        println!("{}", serde_json::to_string_pretty(&report)?);

        Ok(())
    }
}
