//! Calendar-day aggregation of energy and cost.
//!
//! Every energy record folds into exactly one [`DailyBucket`], keyed by the
//! record's local calendar date formatted `%Y-%m-%d`. Rollups probe buckets
//! by exact key match only: the week query formats the last seven local
//! dates and looks each one up, the month query parses bucket keys and
//! compares month and year. Dates with no bucket contribute zero; there is
//! no interpolation.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Formats a local date as a bucket key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Aggregated totals for one local calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    /// Bucket key: the local date formatted `%Y-%m-%d`.
    pub date: String,
    /// Total energy for the day in kWh, always `energy_peak + energy_offpeak`.
    pub energy_total: f64,
    /// Energy consumed during peak hours in kWh.
    pub energy_peak: f64,
    /// Energy consumed outside peak hours in kWh.
    pub energy_offpeak: f64,
    /// Total cost for the day.
    pub cost_total: f64,
    /// Usage-hour approximation: `floor(energy_total * 1000 / 60)`.
    ///
    /// Treats one kWh-minute-equivalent as 1/60 hour-equivalent. Kept as-is
    /// from the device's reporting convention; not a physically exact count.
    pub usage_hours: u64,
}

impl DailyBucket {
    fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            energy_total: 0.0,
            energy_peak: 0.0,
            energy_offpeak: 0.0,
            cost_total: 0.0,
            usage_hours: 0,
        }
    }
}

/// Single-day rollup, zero-valued when the date has no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct DayStats {
    /// Total energy in kWh.
    pub energy_total: f64,
    /// Peak-hours energy in kWh.
    pub energy_peak: f64,
    /// Off-peak energy in kWh.
    pub energy_offpeak: f64,
    /// Total cost.
    pub cost_total: f64,
    /// Usage-hour approximation.
    pub usage_hours: f64,
    /// Mean power in watts over the usage hours, 0 when `usage_hours` is 0.
    pub avg_power: f64,
}

/// Seven-day rollup (today inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct WeekStats {
    /// Total energy in kWh across the days with buckets.
    pub energy_total: f64,
    /// Peak-hours energy in kWh.
    pub energy_peak: f64,
    /// Off-peak energy in kWh.
    pub energy_offpeak: f64,
    /// Total cost.
    pub cost_total: f64,
    /// Summed usage-hour approximations.
    pub usage_hours: f64,
    /// Number of the last 7 local dates that have a bucket.
    pub days_count: u32,
    /// Mean daily energy, present only when `days_count > 0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_daily_avg: Option<f64>,
    /// Mean daily cost, present only when `days_count > 0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_daily_avg: Option<f64>,
}

/// Current-calendar-month rollup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct MonthStats {
    /// Total energy in kWh across the month's buckets.
    pub energy_total: f64,
    /// Peak-hours energy in kWh.
    pub energy_peak: f64,
    /// Off-peak energy in kWh.
    pub energy_offpeak: f64,
    /// Total cost.
    pub cost_total: f64,
    /// Summed usage-hour approximations.
    pub usage_hours: f64,
    /// Number of buckets falling in the current month and year.
    pub days_count: u32,
}

/// Maintains one bucket per local calendar date.
///
/// Mutated only through [`ingest`](DailyAggregator::ingest), which the
/// orchestrating monitor calls from its single energy-recording path. Today's
/// bucket is lazily created on the first record of a new day and deleted only
/// by [`clear`](DailyAggregator::clear).
#[derive(Debug, Clone, Default)]
pub struct DailyAggregator {
    buckets: HashMap<String, DailyBucket>,
}

impl DailyAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one energy record into the bucket for `date`.
    ///
    /// Adds the energy to the total and to the peak or off-peak split per
    /// the record hour's classification, adds the cost, and recomputes the
    /// usage-hour approximation from the new total.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ingest(&mut self, date: &str, energy_kwh: f64, cost: f64, peak: bool) {
        let bucket = self
            .buckets
            .entry(date.to_string())
            .or_insert_with(|| DailyBucket::empty(date));

        bucket.energy_total += energy_kwh;
        if peak {
            bucket.energy_peak += energy_kwh;
        } else {
            bucket.energy_offpeak += energy_kwh;
        }
        bucket.cost_total += cost;
        bucket.usage_hours = (bucket.energy_total * 1000.0 / 60.0) as u64;
    }

    /// Rollup for one local date, zero-valued when no bucket exists.
    #[allow(clippy::cast_precision_loss)]
    pub fn day(&self, date: &str) -> DayStats {
        let Some(bucket) = self.buckets.get(date) else {
            return DayStats::default();
        };

        DayStats {
            energy_total: bucket.energy_total,
            energy_peak: bucket.energy_peak,
            energy_offpeak: bucket.energy_offpeak,
            cost_total: bucket.cost_total,
            usage_hours: bucket.usage_hours as f64,
            // floor(energy*1000/60) is 0 for small positive totals, so the
            // division needs the explicit guard.
            avg_power: if bucket.usage_hours > 0 {
                bucket.energy_total * 1000.0 / bucket.usage_hours as f64
            } else {
                0.0
            },
        }
    }

    /// Rollup across the last 7 local dates, `today` inclusive.
    ///
    /// Probes exactly seven formatted date keys; dates without a bucket
    /// contribute nothing. Daily averages are present only when at least one
    /// bucket matched.
    #[allow(clippy::cast_precision_loss)]
    pub fn week(&self, today: NaiveDate) -> WeekStats {
        let mut stats = WeekStats::default();

        for back in 0..7 {
            let Some(date) = today.checked_sub_days(Days::new(back)) else {
                continue;
            };
            if let Some(bucket) = self.buckets.get(&date_key(date)) {
                stats.energy_total += bucket.energy_total;
                stats.energy_peak += bucket.energy_peak;
                stats.energy_offpeak += bucket.energy_offpeak;
                stats.cost_total += bucket.cost_total;
                stats.usage_hours += bucket.usage_hours as f64;
                stats.days_count += 1;
            }
        }

        if stats.days_count > 0 {
            stats.energy_daily_avg = Some(stats.energy_total / f64::from(stats.days_count));
            stats.cost_daily_avg = Some(stats.cost_total / f64::from(stats.days_count));
        }

        stats
    }

    /// Rollup across every bucket in `today`'s calendar month and year.
    ///
    /// Bucket keys that do not parse as `%Y-%m-%d` are skipped.
    #[allow(clippy::cast_precision_loss)]
    pub fn month(&self, today: NaiveDate) -> MonthStats {
        let mut stats = MonthStats::default();

        for (key, bucket) in &self.buckets {
            let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
                continue;
            };
            if date.month() == today.month() && date.year() == today.year() {
                stats.energy_total += bucket.energy_total;
                stats.energy_peak += bucket.energy_peak;
                stats.energy_offpeak += bucket.energy_offpeak;
                stats.cost_total += bucket.cost_total;
                stats.usage_hours += bucket.usage_hours as f64;
                stats.days_count += 1;
            }
        }

        stats
    }

    /// Iterates the buckets in map order (unordered).
    pub fn buckets(&self) -> impl Iterator<Item = &DailyBucket> {
        self.buckets.values()
    }

    /// Number of distinct dates with a bucket.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Deletes every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_day_records_accumulate() {
        let mut agg = DailyAggregator::new();
        agg.ingest("2026-08-21", 0.5, 2.5, true);
        agg.ingest("2026-08-21", 0.3, 0.6, false);

        let day = agg.day("2026-08-21");
        assert!((day.energy_total - 0.8).abs() < 1e-9);
        assert!((day.energy_peak + day.energy_offpeak - 0.8).abs() < 1e-9);
        assert!((day.energy_peak - 0.5).abs() < 1e-9);
        assert!((day.cost_total - 3.1).abs() < 1e-9);
    }

    #[test]
    fn test_usage_hours_approximation() {
        let mut agg = DailyAggregator::new();
        agg.ingest("2026-08-21", 0.5, 1.0, true);

        // floor(0.5 * 1000 / 60) = floor(8.33) = 8
        let day = agg.day("2026-08-21");
        assert_eq!(day.usage_hours, 8.0);
    }

    #[test]
    fn test_avg_power_guarded_against_zero_usage_hours() {
        let mut agg = DailyAggregator::new();
        // floor(0.02 * 1000 / 60) = 0: positive energy, zero usage hours.
        agg.ingest("2026-08-21", 0.02, 0.04, false);

        let day = agg.day("2026-08-21");
        assert!(day.energy_total > 0.0);
        assert_eq!(day.usage_hours, 0.0);
        assert_eq!(day.avg_power, 0.0);
    }

    #[test]
    fn test_avg_power_value() {
        let mut agg = DailyAggregator::new();
        agg.ingest("2026-08-21", 0.5, 1.0, true);

        // 0.5 kWh over 8 usage hours: 500 / 8 = 62.5 W.
        let day = agg.day("2026-08-21");
        assert_eq!(day.avg_power, 62.5);
    }

    #[test]
    fn test_absent_day_is_zero_valued() {
        let agg = DailyAggregator::new();
        assert_eq!(agg.day("2026-08-21"), DayStats::default());
    }

    #[test]
    fn test_week_counts_only_present_days() {
        let mut agg = DailyAggregator::new();
        let today = date(2026, 8, 21);

        agg.ingest("2026-08-21", 1.0, 5.0, true);
        agg.ingest("2026-08-19", 2.0, 4.0, false);
        agg.ingest("2026-08-15", 3.0, 6.0, true);
        // Outside the 7-day span (today - 7): must not contribute.
        agg.ingest("2026-08-14", 9.0, 9.0, true);

        let week = agg.week(today);
        assert_eq!(week.days_count, 3);
        assert!((week.energy_total - 6.0).abs() < 1e-9);
        assert_eq!(week.energy_daily_avg, Some(2.0));
        assert_eq!(week.cost_daily_avg, Some(5.0));
    }

    #[test]
    fn test_week_empty_has_no_daily_averages() {
        let agg = DailyAggregator::new();
        let week = agg.week(date(2026, 8, 21));

        assert_eq!(week.days_count, 0);
        assert_eq!(week.energy_daily_avg, None);
        assert_eq!(week.cost_daily_avg, None);
        assert_eq!(week.energy_total, 0.0);
    }

    #[test]
    fn test_month_matches_month_and_year_exactly() {
        let mut agg = DailyAggregator::new();
        agg.ingest("2026-08-01", 1.0, 2.0, true);
        agg.ingest("2026-08-21", 2.0, 4.0, false);
        agg.ingest("2026-07-31", 10.0, 20.0, true); // prior month
        agg.ingest("2025-08-21", 10.0, 20.0, true); // prior year, same month
        agg.ingest("not-a-date", 10.0, 20.0, true); // unparseable key

        let month = agg.month(date(2026, 8, 21));
        assert_eq!(month.days_count, 2);
        assert!((month.energy_total - 3.0).abs() < 1e-9);
        assert!((month.cost_total - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_always_equals_peak_plus_offpeak() {
        let mut agg = DailyAggregator::new();
        for (energy, peak) in [(0.11, true), (0.07, false), (0.25, true), (0.4, false)] {
            agg.ingest("2026-08-21", energy, energy * 3.0, peak);
        }

        let day = agg.day("2026-08-21");
        assert!((day.energy_total - (day.energy_peak + day.energy_offpeak)).abs() < 1e-9);
    }

    #[test]
    fn test_clear_removes_buckets() {
        let mut agg = DailyAggregator::new();
        agg.ingest("2026-08-21", 1.0, 2.0, true);
        assert_eq!(agg.bucket_count(), 1);

        agg.clear();
        assert_eq!(agg.bucket_count(), 0);
        assert_eq!(agg.day("2026-08-21"), DayStats::default());
    }

    #[test]
    fn test_date_key_format() {
        assert_eq!(date_key(date(2026, 1, 5)), "2026-01-05");
    }
}
