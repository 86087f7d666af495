//! Peak/off-peak cost table for a constant load.
//!
//! Prints what a 1.5 kW appliance costs at every hour of the day under the
//! default tariff, then shows a schedule update and a rejected one.
//!
//! Run with: `cargo run -p wattmon --example tariff_costing`

use wattmon::TariffConfig;
use wattmon::tariff::TariffEngine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = TariffEngine::new(TariffConfig::default())?;
    let schedule = engine.schedule();

    println!("=== Tariff schedule ===");
    println!(
        "peak    {:.2}/kWh during [{}, {})",
        schedule.peak, schedule.peak_start, schedule.peak_end
    );
    println!("offpeak {:.2}/kWh otherwise\n", schedule.offpeak);

    // A 1.5 kW heater running one full hour at each hour of the day.
    let energy_kwh = 1.5;
    println!("{:>4} {:>6} {:>8}", "hour", "rate", "cost");
    let mut daily_total = 0.0;
    for hour in 0..24 {
        let cost = engine.cost(energy_kwh, hour);
        let marker = if engine.is_peak(hour) { "peak" } else { "off" };
        println!("{hour:>4} {marker:>6} {cost:>8.2}");
        daily_total += cost;
    }
    println!("\nrunning it all day costs {daily_total:.2}");
    println!(
        "estimated savings from shaving 3 kWh: {:.2}",
        3.0 * engine.average_rate()
    );

    engine.set_peak_window(7, 22)?;
    println!(
        "\nnew window [{}, {})",
        engine.schedule().peak_start,
        engine.schedule().peak_end
    );

    // A reversed window is refused and the schedule stays put.
    if let Err(e) = engine.set_peak_window(22, 7) {
        println!("reversed window refused: {e}");
    }

    Ok(())
}
