//! Integration tests for the CSV export surface.

use std::collections::HashSet;

use wattmon::daily::DailyAggregator;
use wattmon::export::{CSV_HEADER, write_daily_csv};
use wattmon::{MonitorConfig, PowerMonitor};

#[test]
fn test_export_writes_exact_header_and_bucket_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.csv");

    let mut agg = DailyAggregator::new();
    agg.ingest("2026-08-20", 1.5, 7.5, true);
    agg.ingest("2026-08-21", 0.5, 1.0, false);

    write_daily_csv(&path, &agg).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Energy Total (kWh),Energy Peak (kWh),Energy Offpeak (kWh),Cost Total (RUB),Usage Hours")
    );

    // Bucket order is map order; compare as a set.
    let rows: HashSet<&str> = lines.collect();
    let expected: HashSet<&str> = ["2026-08-20,1.5,1.5,0,7.5,25", "2026-08-21,0.5,0,0.5,1,8"]
        .into_iter()
        .collect();
    assert_eq!(rows, expected);
}

#[test]
fn test_monitor_export_reflects_recorded_energy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daily.csv");

    let monitor = PowerMonitor::new(&MonitorConfig::default()).unwrap();
    // 3000 W sustained for one hour is exactly 3 kWh.
    monitor.add_power_reading(3000.0, 3600.0);

    monitor.export_csv(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2, "header plus one bucket row");
    assert_eq!(lines[0], CSV_HEADER);

    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields.len(), 6);
    let energy_total: f64 = fields[1].parse().unwrap();
    assert!((energy_total - 3.0).abs() < 1e-9);
    // floor(3.0 * 1000 / 60) = 50 usage hours.
    assert_eq!(fields[5], "50");
}

#[test]
fn test_export_failure_surfaces_as_error() {
    let monitor = PowerMonitor::new(&MonitorConfig::default()).unwrap();
    assert!(monitor.export_csv("/nonexistent/dir/daily.csv").is_err());
}

#[test]
fn test_reexport_truncates_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.csv");

    let mut agg = DailyAggregator::new();
    agg.ingest("2026-08-20", 1.0, 2.0, false);
    write_daily_csv(&path, &agg).unwrap();

    agg.clear();
    write_daily_csv(&path, &agg).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, format!("{CSV_HEADER}\n"));
}
