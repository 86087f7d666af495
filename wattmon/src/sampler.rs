//! Background telemetry sampling loop.
//!
//! One dedicated thread polls the sample source every [`TICK`], applies the
//! calibration factor, and publishes the reading behind a single mutex that
//! also holds the rolling power window. Readers copy out; a publish is never
//! torn. Once per second the latest power lands in the window, and every 30
//! seconds the loop emits a diagnostic summary.
//!
//! Stopping sets an atomic flag and joins the thread; the in-flight sample
//! completes, so the join is bounded by one tick. After stop every read
//! returns the frozen snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::SensorConfig;
use crate::reading::Reading;
use crate::source::{SampleSource, SimulatedLoad, SourceKind, build_source};
use crate::window::{RollingWindow, WindowStats};

// ── Loop cadences ───────────────────────────────────────────────────

/// Sampling tick period.
pub const TICK: Duration = Duration::from_millis(100);
/// Interval between pushes of the latest power into the rolling window.
const WINDOW_PERIOD: Duration = Duration::from_secs(1);
/// Interval between diagnostic summaries.
const SUMMARY_PERIOD: Duration = Duration::from_secs(30);

/// Lifecycle of the sampling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Created, thread not yet spawned.
    Idle,
    /// Thread running, readings being published.
    Running,
    /// Thread joined, snapshot frozen.
    Stopped,
}

/// Callback invoked with `(power_watts, threshold_watts)` when power meets
/// or exceeds a configured threshold.
///
/// The callback runs on the sampling thread with no sampler lock held, so
/// it may call back into the sampler (for example to raise the thresholds
/// after an alert).
pub type ThresholdHook = Arc<dyn Fn(f64, f64) + Send + Sync>;

/// Everything the sampling thread publishes, behind one lock.
struct Shared {
    current: Reading,
    last_valid: Reading,
    window: RollingWindow,
}

struct Hooks {
    on_threshold: Option<ThresholdHook>,
    warning: f64,
    critical: f64,
}

/// Samples a [`SampleSource`] on a background thread.
///
/// Construction never touches hardware. [`start`](Sampler::start) builds the
/// configured backend; when a real backend is unavailable the sampler logs a
/// warning and falls back to the synthetic source rather than failing.
pub struct Sampler {
    shared: Arc<Mutex<Shared>>,
    hooks: Arc<Mutex<Hooks>>,
    load: SimulatedLoad,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    state: SamplerState,
    active_kind: SourceKind,
    configured_kind: SourceKind,
    calibration: f64,
}

impl Sampler {
    /// Creates an idle sampler from sensor settings.
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                current: Reading::default(),
                last_valid: Reading::default(),
                window: RollingWindow::new(),
            })),
            hooks: Arc::new(Mutex::new(Hooks {
                on_threshold: None,
                warning: config.warning_threshold,
                critical: config.critical_threshold,
            })),
            load: SimulatedLoad::default(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            state: SamplerState::Idle,
            active_kind: config.kind,
            configured_kind: config.kind,
            calibration: config.calibration,
        }
    }

    /// Spawns the sampling thread.
    ///
    /// When the configured backend cannot be built the sampler logs the
    /// failure and continues with the synthetic source; an unavailable
    /// sensor is a degraded mode, not a startup error. Calling `start` on a
    /// sampler that is already running is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` reserves the right for a future
    /// real backend to refuse startup.
    pub fn start(&mut self) -> crate::error::Result<()> {
        if self.state == SamplerState::Running {
            return Ok(());
        }

        let source = match build_source(self.configured_kind, self.load.clone()) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(
                    "sensor backend '{}' unavailable ({e}), falling back to synthetic",
                    self.configured_kind
                );
                build_source(SourceKind::Synthetic, self.load.clone())?
            }
        };
        self.active_kind = source.kind();

        self.running.store(true, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let hooks = Arc::clone(&self.hooks);
        let running = Arc::clone(&self.running);
        let calibration = self.calibration;

        self.handle = Some(std::thread::spawn(move || {
            sample_loop(source, &shared, &hooks, &running, calibration);
        }));
        self.state = SamplerState::Running;
        tracing::info!("sampler started ({} source)", self.active_kind);
        Ok(())
    }

    /// Stops the sampling thread and freezes the snapshot.
    ///
    /// The flag is checked once per tick, so the join completes within
    /// roughly one tick period. No-op unless running.
    pub fn stop(&mut self) {
        if self.state != SamplerState::Running {
            return;
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.state = SamplerState::Stopped;
        tracing::info!("sampler stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Kind of the source actually sampling (after any fallback).
    pub fn source_kind(&self) -> SourceKind {
        self.active_kind
    }

    /// Most recently published reading, valid or not.
    pub fn current_reading(&self) -> Reading {
        self.lock_shared().current
    }

    /// Most recent reading that passed validity checks.
    pub fn last_valid_reading(&self) -> Reading {
        self.lock_shared().last_valid
    }

    /// Power statistics over the trailing `seconds` of window slots.
    pub fn window_stats(&self, seconds: usize) -> WindowStats {
        self.lock_shared().window.stats(seconds)
    }

    /// Adjusts the synthetic source's constant load. No effect on real
    /// backends.
    pub fn set_simulated_load(&self, watts: f64) {
        self.load.set(watts);
    }

    /// Zeroes the cumulative energy on both published readings.
    ///
    /// The rolling window is untouched; with a live synthetic source the
    /// accumulator keeps running and the next tick publishes fresh totals.
    pub fn reset_energy(&self) {
        let mut shared = self.lock_shared();
        shared.current.cumulative_energy = 0.0;
        shared.last_valid.cumulative_energy = 0.0;
    }

    /// Installs the power threshold callback.
    pub fn on_threshold(&self, hook: ThresholdHook) {
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.on_threshold = Some(hook);
        }
    }

    /// Replaces the warning/critical power thresholds (watts).
    pub fn set_power_thresholds(&self, warning: f64, critical: f64) {
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.warning = warning;
            hooks.critical = critical;
        }
    }

    // A poisoned lock still holds a valid snapshot; recover the guard.
    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Sampling thread ─────────────────────────────────────────────────

fn sample_loop(
    mut source: Box<dyn SampleSource>,
    shared: &Arc<Mutex<Shared>>,
    hooks: &Arc<Mutex<Hooks>>,
    running: &Arc<AtomicBool>,
    calibration: f64,
) {
    let mut last_window_push = Instant::now();
    let mut last_summary = Instant::now();

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(TICK);
        // One clock fetch drives every cadence decision this iteration.
        let now = Instant::now();
        let window_due = now.duration_since(last_window_push) >= WINDOW_PERIOD;
        let summary_due = now.duration_since(last_summary) >= SUMMARY_PERIOD;

        let published = match source.next_reading() {
            Ok(raw) => {
                let reading = raw.calibrated(calibration);
                let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                guard.current = reading;
                if reading.is_valid() {
                    guard.last_valid = reading;
                }
                if window_due {
                    let power = guard.current.real_power;
                    guard.window.push(power);
                }
                Some(reading)
            }
            Err(e) => {
                // Keep the previous snapshot; the window keeps advancing on
                // the latest published power.
                tracing::warn!("sensor read failed: {e}");
                if window_due {
                    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    let power = guard.current.real_power;
                    guard.window.push(power);
                }
                None
            }
        };

        if window_due {
            last_window_push = now;
        }

        if let Some(reading) = published {
            check_thresholds(hooks, reading.real_power);
        }

        if summary_due {
            last_summary = now;
            let guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
            tracing::debug!(
                "sampling {:.1} W at {:.1} V, {:.3} kWh accumulated",
                guard.current.real_power,
                guard.current.voltage,
                guard.current.cumulative_energy
            );
        }
    }
}

/// Fires the threshold hook at most once per tick, critical level first.
///
/// The hook and level are resolved under the lock; the callback itself runs
/// after the guard is released.
fn check_thresholds(hooks: &Arc<Mutex<Hooks>>, power: f64) {
    let mut fired = None;
    if let Ok(guard) = hooks.lock() {
        let Some(hook) = guard.on_threshold.as_ref() else {
            return;
        };
        if power >= guard.critical {
            fired = Some((Arc::clone(hook), guard.critical));
        } else if power >= guard.warning {
            fired = Some((Arc::clone(hook), guard.warning));
        }
    }
    if let Some((hook, threshold)) = fired {
        hook(power, threshold);
    }
}
