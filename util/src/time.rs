//! General time utility functions

use std::time::{Duration, Instant};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a chrono duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a std duration into whole microseconds, saturating at `u64::MAX`.
pub fn duration_to_micros(duration: Duration) -> u64 {
    let us = duration.as_micros();
    if us > u64::MAX as u128 {
        u64::MAX
    } else {
        us as u64
    }
}

/// Build a duration from a number of seconds, negative and non-finite values
/// give a zero duration.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::from_secs(0)
    }
}

/// A start/stop timer measuring elapsed wall time in seconds.
///
/// A stopwatch which has never been started (or has been reset) reads 0.0.
#[derive(Debug, Default, Clone)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) timing. Does nothing if already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stop timing, keeping the elapsed time so far.
    pub fn stop(&mut self) {
        if let Some(t) = self.started_at.take() {
            self.accumulated += t.elapsed();
        }
    }

    /// Stop and clear the elapsed time.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::from_secs(0);
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Elapsed time in seconds.
    pub fn get(&self) -> f64 {
        let running = self
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        (self.accumulated + running).as_secs_f64()
    }
}
