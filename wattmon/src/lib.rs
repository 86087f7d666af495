//! # wattmon
//!
//! Embedded electrical telemetry sampling and statistics engine.
//!
//! wattmon is a Rust library for device controllers that watch a power
//! line: it samples voltage, current, power, frequency, and cumulative
//! energy on a background thread, aggregates the stream into calendar-day
//! buckets with peak/off-peak tariff costing, and answers read-only
//! statistics queries. Designed for single-board computers metering a
//! household feed.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Fixed-cadence sampling (100 ms tick) on one dedicated thread
//! - Bounded memory: 1-hour rolling power window, 43 200-record energy ledger
//! - Peak/off-peak costing over a half-open local-hour window
//! - Daily, weekly, and monthly rollups keyed by local calendar date
//! - Queries never fail; absent data reads back as zeros
//! - Synthetic source stands in when the hardware backend is unavailable
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wattmon::{MonitorConfig, PowerMonitor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Default configuration samples the synthetic source.
//! let mut monitor = PowerMonitor::new(&MonitorConfig::default())?;
//! monitor.start()?;
//!
//! std::thread::sleep(std::time::Duration::from_secs(2));
//!
//! let reading = monitor.current_reading();
//! println!("{:.1} V, {:.1} W", reading.voltage, reading.real_power);
//!
//! // Account one minute of sustained draw into the daily statistics.
//! monitor.add_power_reading(reading.real_power, 60.0);
//! println!("today: {:?}", monitor.today());
//!
//! monitor.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`PowerMonitor`] — Top-level controller; owns the sampler, tariff
//!   engine, ledger, and daily buckets
//! - [`Reading`] — One calibrated sample of the electrical quantities
//! - [`EnergyRecord`] — One stamped, costed energy delta
//! - [`MonitorConfig`] — Serde-backed configuration with full defaults
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`monitor`] — Orchestrator and statistics queries
//! - [`sampler`] — Background sampling loop and threshold hooks
//! - [`source`] — Sample source trait, backend kinds, synthetic generator
//! - [`reading`] — The telemetry sample type
//! - [`window`] — Fixed-capacity rolling power window
//! - [`tariff`] — Peak/off-peak rates and cost computation
//! - [`ledger`] — Bounded energy record history
//! - [`daily`] — Calendar-day aggregation and rollups
//! - [`export`] — CSV export of daily statistics
//! - [`thermal`] — CPU temperature probe
//! - [`config`] — Configuration file loading and validation
//! - [`error`] — Error types

pub mod config;
pub mod daily;
pub mod error;
pub mod export;
pub mod ledger;
pub mod monitor;
pub mod reading;
pub mod sampler;
pub mod source;
pub mod tariff;
pub mod thermal;
pub mod window;

// Re-export primary API types at crate root for convenience.
pub use config::{MonitorConfig, SensorConfig, TariffConfig};
pub use daily::{DayStats, MonthStats, WeekStats};
pub use error::{Result, WattmonError};
pub use ledger::EnergyRecord;
pub use monitor::PowerMonitor;
pub use reading::Reading;
pub use sampler::SamplerState;
pub use source::SourceKind;
pub use window::WindowStats;
