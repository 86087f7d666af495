//! CLI for the wattmon telemetry engine.
//!
//! Provides commands for costing energy, inspecting tariff schedules, and
//! running short synthetic sampling sessions without deploying the daemon.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use wattmon::tariff::TariffEngine;
use wattmon::{MonitorConfig, PowerMonitor, TariffConfig};

/// wattmon — Embedded electrical telemetry engine CLI.
#[derive(Parser)]
#[command(name = "wattmon", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a short synthetic sampling session and print what it measured.
    Simulate {
        /// How long to sample (e.g., "5s", "2m").
        #[arg(long, default_value = "5s")]
        duration: String,

        /// Simulated constant load in watts.
        #[arg(long, default_value = "100")]
        load: f64,

        /// Output format.
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Cost a one-off energy amount consumed at a given local hour.
    Cost {
        /// Energy in kWh.
        energy: f64,

        /// Local hour of consumption (0-23).
        hour: u32,

        /// Peak rate per kWh.
        #[arg(long, default_value = "5.0")]
        peak: f64,

        /// Off-peak rate per kWh.
        #[arg(long, default_value = "2.0")]
        offpeak: f64,
    },

    /// Print the hour-by-hour tariff classification table.
    Schedule {
        /// First peak hour (inclusive).
        #[arg(long, default_value = "8")]
        peak_start: u32,

        /// End of the peak window (exclusive).
        #[arg(long, default_value = "23")]
        peak_end: u32,

        /// Peak rate per kWh.
        #[arg(long, default_value = "5.0")]
        peak: f64,

        /// Off-peak rate per kWh.
        #[arg(long, default_value = "2.0")]
        offpeak: f64,
    },
}

/// Output format for simulation results.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Aligned per-second table.
    Table,
    /// Single JSON object.
    Json,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            duration,
            load,
            format,
        } => cmd_simulate(&duration, load, &format),
        Commands::Cost {
            energy,
            hour,
            peak,
            offpeak,
        } => cmd_cost(energy, hour, peak, offpeak),
        Commands::Schedule {
            peak_start,
            peak_end,
            peak,
            offpeak,
        } => cmd_schedule(peak_start, peak_end, peak, offpeak),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Implements `wattmon simulate`.
fn cmd_simulate(
    duration: &str,
    load: f64,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let duration = parse_duration(duration)?;
    let seconds = duration.as_secs().max(1);

    let mut monitor = PowerMonitor::new(&MonitorConfig::default())?;
    monitor.set_simulated_load(load);
    monitor.start()?;

    match format {
        OutputFormat::Table => {
            println!(
                "{:>4} {:>9} {:>9} {:>9} {:>6} {:>7} {:>12}",
                "t", "voltage", "current", "power", "pf", "freq", "energy_kwh"
            );
            for t in 1..=seconds {
                std::thread::sleep(Duration::from_secs(1));
                let r = monitor.current_reading();
                println!(
                    "{t:>4} {:>9.1} {:>9.3} {:>9.1} {:>6.2} {:>7.2} {:>12.6}",
                    r.voltage, r.current, r.real_power, r.power_factor, r.frequency, r.cumulative_energy
                );
            }
            monitor.stop();

            let span = usize::try_from(seconds).unwrap_or(usize::MAX);
            let stats = monitor.window_stats(span);
            println!();
            println!(
                "window: avg {:.1} W, max {:.1} W, min {:.1} W",
                stats.average, stats.max, stats.min
            );
            println!("status: {}", monitor.status());
        }
        OutputFormat::Json => {
            std::thread::sleep(duration);
            monitor.stop();

            let span = usize::try_from(seconds).unwrap_or(usize::MAX);
            let output = serde_json::json!({
                "reading": monitor.current_reading(),
                "window": monitor.window_stats(span),
                "status": monitor.status(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Implements `wattmon cost`.
fn cmd_cost(
    energy: f64,
    hour: u32,
    peak: f64,
    offpeak: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    if hour > 23 {
        return Err(format!("Hour must be 0-23, got {hour}").into());
    }
    if !energy.is_finite() || energy < 0.0 {
        return Err(format!("Energy must be a non-negative number, got {energy}").into());
    }

    let engine = TariffEngine::new(TariffConfig {
        peak,
        offpeak,
        ..TariffConfig::default()
    })?;

    let class = if engine.is_peak(hour) { "peak" } else { "off-peak" };
    println!(
        "{energy} kWh at hour {hour:02} ({class}): {:.2}",
        engine.cost(energy, hour)
    );
    println!(
        "flat-rate equivalent at {:.2}/kWh: {:.2}",
        engine.average_rate(),
        energy * engine.average_rate()
    );

    Ok(())
}

/// Implements `wattmon schedule`.
fn cmd_schedule(
    peak_start: u32,
    peak_end: u32,
    peak: f64,
    offpeak: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TariffEngine::new(TariffConfig {
        peak_start,
        peak_end,
        peak,
        offpeak,
    })?;

    let schedule = engine.schedule();
    println!(
        "peak window [{:02}:00, {:02}:00), rates {:.2}/{:.2} per kWh",
        schedule.peak_start, schedule.peak_end, schedule.peak, schedule.offpeak
    );
    println!();
    println!("{:>4} {:>9} {:>7}", "hour", "class", "rate");

    for hour in 0..24 {
        let class = if engine.is_peak(hour) { "peak" } else { "off" };
        println!("{hour:>4} {class:>9} {:>7.2}", engine.cost(1.0, hour));
    }

    Ok(())
}

/// Parses a human-readable duration string (e.g., "30s", "5m", "1h").
fn parse_duration(s: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Empty duration string".into());
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: u64 = num_str.parse()?;

    let secs = match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        "d" => num * 86400,
        _ => return Err(format!("Unknown duration unit: '{unit}'. Use s, m, h, or d.").into()),
    };

    Ok(Duration::from_secs(secs))
}
