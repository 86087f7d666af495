//! Flat-file export of daily statistics.
//!
//! One CSV row per daily bucket, in map-iteration order. Row order is
//! unspecified; consumers that need it sorted sort on the date column. The
//! target file is created or truncated, and a failed write may leave a
//! partial file behind.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::daily::DailyAggregator;
use crate::error::{Result, StorageError};

/// Header row of the daily statistics CSV.
pub const CSV_HEADER: &str =
    "Date,Energy Total (kWh),Energy Peak (kWh),Energy Offpeak (kWh),Cost Total (RUB),Usage Hours";

/// Writes every daily bucket of `aggregator` as CSV to `path`.
///
/// # Errors
///
/// Returns [`StorageError::Create`] when the file cannot be created and
/// [`StorageError::Write`] when writing the rows fails.
pub fn write_daily_csv<P: AsRef<Path>>(path: P, aggregator: &DailyAggregator) -> Result<()> {
    let path = path.as_ref();

    let mut body = String::from(CSV_HEADER);
    body.push('\n');
    for bucket in aggregator.buckets() {
        body.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bucket.date,
            bucket.energy_total,
            bucket.energy_peak,
            bucket.energy_offpeak,
            bucket.cost_total,
            bucket.usage_hours
        ));
    }

    let mut file = File::create(path).map_err(|e| StorageError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(body.as_bytes())
        .map_err(|e| StorageError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;

    tracing::info!("daily statistics exported to {}", path.display());
    Ok(())
}
