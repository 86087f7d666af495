//! Long-running telemetry controller built on wattmon.
//!
//! This binary loads a JSON configuration, starts the background sampler,
//! folds sampled power into the energy ledger at a fixed interval, and logs
//! threshold breaches. On an orderly shutdown it exports the daily CSV and
//! prints the JSON report.

mod service;

use std::path::PathBuf;

use clap::Parser;

/// wattmon-daemon — Long-running electrical telemetry controller.
#[derive(Parser)]
#[command(name = "wattmon-daemon", version, about)]
struct Cli {
    /// Path to the JSON configuration file. Defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run before the orderly shutdown (e.g., "45m", "2h").
    /// Runs until killed when absent.
    #[arg(long)]
    duration: Option<String>,

    /// Write the daily statistics CSV here on shutdown.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Seconds between energy accounting pushes.
    #[arg(long, default_value = "60")]
    interval: u64,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("daemon failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = service::Settings {
        config_path: cli.config,
        run_for: cli.duration.as_deref().map(parse_duration).transpose()?,
        export_path: cli.export,
        push_interval: std::time::Duration::from_secs(cli.interval.max(1)),
    };

    let mut service = service::Service::new(settings)?;
    service.run()?;

    tracing::info!("daemon exited cleanly");
    Ok(())
}

/// Parses a human-readable duration string (e.g., "30s", "5m", "2h").
fn parse_duration(s: &str) -> Result<std::time::Duration, Box<dyn std::error::Error>> {
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

    Ok(std::time::Duration::from_secs(secs))
}
