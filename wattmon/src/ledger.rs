//! Bounded append-only history of energy records.
//!
//! Every energy delta pushed through the engine becomes one immutable
//! [`EnergyRecord`]. The ledger holds a bounded count of them (not a time
//! span): once the cap is exceeded the oldest record is evicted, FIFO.

use std::collections::VecDeque;

use serde::Serialize;

/// Default record cap: 12 hours at one record per second, or 30 days at one
/// per minute, depending on call cadence.
pub const DEFAULT_CAPACITY: usize = 43200;

/// One energy delta and its computed cost at a point in time.
///
/// Records are immutable once appended. The caller stamps the wall-clock
/// time and computes the cost before appending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct EnergyRecord {
    /// Wall-clock record time in seconds since the Unix epoch.
    pub timestamp_seconds: i64,
    /// The energy delta in kilowatt-hours, >= 0.
    pub energy_kwh: f64,
    /// The cost of the delta under the tariff active at record time, >= 0.
    pub cost: f64,
}

/// Bounded FIFO sequence of energy records.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    records: VecDeque<EnergyRecord>,
    capacity: usize,
}

impl HistoryLedger {
    /// Creates a ledger with the default 43200-record cap.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a ledger with a custom record cap.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ledger capacity must be > 0");
        Self {
            records: VecDeque::new(),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest once the cap is exceeded.
    pub fn append(&mut self, record: EnergyRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Records with `timestamp >= now - hours*3600`, oldest first.
    ///
    /// The ledger is append-only with monotonically stamped records, so the
    /// natural order is already chronological.
    pub fn history(&self, hours: u32, now_seconds: i64) -> Vec<EnergyRecord> {
        let cutoff = now_seconds - i64::from(hours) * 3600;
        self.records
            .iter()
            .filter(|r| r.timestamp_seconds >= cutoff)
            .copied()
            .collect()
    }

    /// The most recent record, or a zero-valued record when empty.
    pub fn latest(&self) -> EnergyRecord {
        self.records.back().copied().unwrap_or_default()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record has been appended (or all were cleared).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record cap.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: i64, energy: f64) -> EnergyRecord {
        EnergyRecord {
            timestamp_seconds: ts,
            energy_kwh: energy,
            cost: energy * 2.0,
        }
    }

    #[test]
    fn test_append_and_latest() {
        let mut ledger = HistoryLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.latest(), EnergyRecord::default());

        ledger.append(record(100, 0.5));
        ledger.append(record(200, 0.3));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().timestamp_seconds, 200);
        assert_eq!(ledger.latest().energy_kwh, 0.3);
    }

    #[test]
    fn test_fifo_eviction_at_cap() {
        let mut ledger = HistoryLedger::with_capacity(3);

        for i in 0..5 {
            ledger.append(record(i, 0.1));
        }

        assert_eq!(ledger.len(), 3);
        let retained = ledger.history(24, 100);
        assert_eq!(
            retained.iter().map(|r| r.timestamp_seconds).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_history_filters_by_cutoff() {
        let mut ledger = HistoryLedger::new();
        let now = 100_000;

        ledger.append(record(now - 7200, 0.1)); // 2h ago
        ledger.append(record(now - 3600, 0.2)); // exactly 1h ago
        ledger.append(record(now - 60, 0.3)); // 1min ago

        let last_hour = ledger.history(1, now);
        assert_eq!(last_hour.len(), 2);
        assert_eq!(last_hour[0].energy_kwh, 0.2);
        assert_eq!(last_hour[1].energy_kwh, 0.3);

        let last_day = ledger.history(24, now);
        assert_eq!(last_day.len(), 3);
    }

    #[test]
    fn test_history_is_chronological() {
        let mut ledger = HistoryLedger::new();
        for i in 0..10 {
            ledger.append(record(1000 + i, 0.1));
        }

        let all = ledger.history(24, 2000);
        let timestamps: Vec<_> = all.iter().map(|r| r.timestamp_seconds).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn test_clear() {
        let mut ledger = HistoryLedger::new();
        ledger.append(record(1, 0.5));
        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.latest(), EnergyRecord::default());
    }
}
