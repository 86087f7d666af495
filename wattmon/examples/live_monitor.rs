//! Live synthetic monitoring session.
//!
//! Starts the sampler against the synthetic source, prints one reading per
//! second, then dumps the statistics map and today's rollup.
//!
//! Run with: `cargo run -p wattmon --example live_monitor`

use std::time::Duration;

use wattmon::{MonitorConfig, PowerMonitor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut monitor = PowerMonitor::new(&MonitorConfig::default())?;
    monitor.start()?;
    println!("sampling synthetic source for 5 seconds...\n");

    for _ in 0..5 {
        std::thread::sleep(Duration::from_secs(1));
        let r = monitor.current_reading();
        println!(
            "{:6.1} V  {:5.3} A  {:6.1} W  pf {:.2}  {:5.2} Hz  {:.6} kWh",
            r.voltage, r.current, r.real_power, r.power_factor, r.frequency, r.cumulative_energy
        );
    }

    // Account the observed draw as one minute of sustained load.
    let power = monitor.current_reading().real_power;
    monitor.add_power_reading(power, 60.0);

    println!("\n=== Statistics (60 s window) ===");
    for (key, value) in monitor.statistics(60) {
        println!("{key:>16}: {value:.3}");
    }

    let today = monitor.today();
    println!(
        "\ntoday: {:.4} kWh, cost {:.2}",
        today.energy_total, today.cost_total
    );
    println!("status: {}", monitor.status());

    monitor.stop();
    Ok(())
}
