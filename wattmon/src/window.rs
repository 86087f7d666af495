//! Rolling window of per-second power samples.
//!
//! This module provides the fixed-capacity circular history backing the
//! trailing-window power queries (average/max/min over the last N seconds).
//!
//! # Design
//!
//! - The window is always "full": every slot holds either a real sample or
//!   the zero it was initialized with. There is no separate empty state.
//! - `push` is O(1) and overwrites the oldest slot.
//! - Slots with values <= 0 are treated as "no reading yet" by `average` and
//!   `min`. A sample of exactly 0 W is indistinguishable from an empty slot;
//!   this convention is part of the query contract.
//! - Query spans are clamped to `[1, capacity]`; a span of 0 or one beyond
//!   capacity falls back to the 60-second default.

use serde::Serialize;

/// Default window capacity: one slot per second of history.
pub const DEFAULT_CAPACITY: usize = 3600;

/// Fallback query span in seconds when the requested span is out of range.
const DEFAULT_SPAN_SECS: usize = 60;

/// Trailing-window statistics over recent power samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    /// Mean of the valid (> 0) samples in the span, 0.0 when none.
    pub average: f64,
    /// Largest sample in the span, 0.0 when none exceed zero.
    pub max: f64,
    /// Smallest valid (> 0) sample in the span, 0.0 when none.
    pub min: f64,
}

/// Fixed-capacity circular buffer of per-second power values.
///
/// The sampler pushes the latest real-power value once per second; queries
/// walk backwards from the newest slot. The buffer is exclusively mutated by
/// the sampler and shares its lock, so no internal synchronization is needed.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    /// Sample slots, zero-initialized.
    slots: Vec<f64>,
    /// Index of the next slot to overwrite (the oldest sample).
    head: usize,
}

impl RollingWindow {
    /// Creates a window with the default capacity of 3600 slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a window with a custom capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be > 0");
        Self {
            slots: vec![0.0; capacity],
            head: 0,
        }
    }

    /// Returns the fixed slot count. The window never under- or over-fills.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Overwrites the oldest slot with `value`.
    pub fn push(&mut self, value: f64) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Clamps a requested span to `[1, capacity]`.
    ///
    /// Out-of-range spans (0, or beyond capacity) fall back to the 60-second
    /// default, itself bounded by capacity for small windows.
    fn clamp_span(&self, seconds: usize) -> usize {
        if seconds == 0 || seconds > self.slots.len() {
            DEFAULT_SPAN_SECS.min(self.slots.len())
        } else {
            seconds
        }
    }

    /// Iterates the most recent `span` slots, newest first.
    fn recent(&self, span: usize) -> impl Iterator<Item = f64> + '_ {
        let len = self.slots.len();
        (1..=span).map(move |back| self.slots[(self.head + len - back) % len])
    }

    /// Mean of the valid (> 0) samples over the last `seconds` slots.
    ///
    /// Returns 0.0 when every slot in the span is invalid. The divisor is
    /// the count of valid samples, not the span length: a single 500 W
    /// sample in an otherwise empty window averages to exactly 500.
    pub fn average(&self, seconds: usize) -> f64 {
        let span = self.clamp_span(seconds);
        let mut sum = 0.0;
        let mut count = 0u32;

        for value in self.recent(span) {
            if value > 0.0 {
                sum += value;
                count += 1;
            }
        }

        if count == 0 { 0.0 } else { sum / f64::from(count) }
    }

    /// Largest sample over the last `seconds` slots, scanned up from 0.0.
    ///
    /// An all-invalid span returns 0.0.
    pub fn max(&self, seconds: usize) -> f64 {
        let span = self.clamp_span(seconds);
        self.recent(span).fold(0.0, f64::max)
    }

    /// Smallest valid (> 0) sample over the last `seconds` slots.
    ///
    /// Returns 0.0 when no slot in the span is valid, never a sentinel
    /// maximum.
    pub fn min(&self, seconds: usize) -> f64 {
        let span = self.clamp_span(seconds);
        let mut min: Option<f64> = None;

        for value in self.recent(span) {
            if value > 0.0 {
                min = Some(min.map_or(value, |m| m.min(value)));
            }
        }

        min.unwrap_or(0.0)
    }

    /// Computes average, max, and min over the last `seconds` slots in one
    /// pass.
    pub fn stats(&self, seconds: usize) -> WindowStats {
        let span = self.clamp_span(seconds);
        let mut sum = 0.0;
        let mut count = 0u32;
        let mut max = 0.0f64;
        let mut min: Option<f64> = None;

        for value in self.recent(span) {
            max = max.max(value);
            if value > 0.0 {
                sum += value;
                count += 1;
                min = Some(min.map_or(value, |m| m.min(value)));
            }
        }

        WindowStats {
            average: if count == 0 { 0.0 } else { sum / f64::from(count) },
            max,
            min: min.unwrap_or(0.0),
        }
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}
