//! Builds a week of daily buckets and exports them as CSV.
//!
//! Run with: `cargo run -p wattmon --example daily_export`

use chrono::{Days, Local};
use wattmon::daily::{DailyAggregator, date_key};
use wattmon::export::write_daily_csv;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut aggregator = DailyAggregator::new();
    let today = Local::now().date_naive();

    // Seven days of household load, heavier every sixth day.
    for back in 0..7 {
        let Some(date) = today.checked_sub_days(Days::new(back)) else {
            continue;
        };
        let energy = if back % 6 == 0 { 4.8 } else { 2.9 };
        // 70 % of the day's energy falls in peak hours at 5.0/kWh.
        aggregator.ingest(&date_key(date), energy * 0.7, energy * 0.7 * 5.0, true);
        aggregator.ingest(&date_key(date), energy * 0.3, energy * 0.3 * 2.0, false);
    }

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("weekly_stats.csv");
    write_daily_csv(&path, &aggregator)?;

    println!("{}", std::fs::read_to_string(&path)?);

    let week = aggregator.week(today);
    println!(
        "week: {:.1} kWh over {} days (avg {:.2} kWh/day, cost {:.2})",
        week.energy_total,
        week.days_count,
        week.energy_daily_avg.unwrap_or(0.0),
        week.cost_total
    );

    Ok(())
}
