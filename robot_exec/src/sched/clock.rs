//! # Scheduler clock and wait primitives

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use util::time::duration_to_micros;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic clock with microsecond resolution.
pub trait Clock: Send + Sync {
    /// Microseconds since an arbitrary fixed epoch.
    fn now_us(&self) -> u64;
}

/// Something the scheduler can block on between iterations.
pub trait Waiter {
    /// Block for at most `duration`.
    fn wait(&mut self, duration: Duration) -> Wake;
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

/// Waits on the quit channel of a task, so a quit request cuts the wait short.
pub struct QuitWaiter {
    quit_rx: Receiver<()>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Why a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full duration elapsed
    Elapsed,

    /// The wait was cut short by a quit request
    Interrupted,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        duration_to_micros(self.epoch.elapsed())
    }
}

impl QuitWaiter {
    pub fn new(quit_rx: Receiver<()>) -> Self {
        Self { quit_rx }
    }
}

impl Waiter for QuitWaiter {
    fn wait(&mut self, duration: Duration) -> Wake {
        match self.quit_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => Wake::Elapsed,
            // A disconnected channel means the handle is gone, which is also a quit
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Wake::Interrupted,
        }
    }
}

// ---------------------------------------------------------------------------
// TEST HELPERS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// A clock which only moves when told to.
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now_us: AtomicU64,
    }

    impl ManualClock {
        pub fn starting_at(now_us: u64) -> Self {
            Self {
                now_us: AtomicU64::new(now_us),
            }
        }

        pub fn advance(&self, us: u64) {
            self.now_us.fetch_add(us, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_us(&self) -> u64 {
            self.now_us.load(Ordering::SeqCst)
        }
    }

    /// A waiter which advances a manual clock by the requested duration and records the time it
    /// woke up at.
    pub struct RecordingWaiter {
        pub clock: Arc<ManualClock>,
        pub wakes_us: Vec<u64>,
    }

    impl Waiter for RecordingWaiter {
        fn wait(&mut self, duration: Duration) -> Wake {
            self.clock.advance(duration_to_micros(duration));
            self.wakes_us.push(self.clock.now_us());
            Wake::Elapsed
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_quit_waiter() {
        let (tx, rx) = channel();
        let mut waiter = QuitWaiter::new(rx);

        assert_eq!(waiter.wait(Duration::from_millis(1)), Wake::Elapsed);

        tx.send(()).unwrap();
        let start = Instant::now();
        assert_eq!(waiter.wait(Duration::from_secs(10)), Wake::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(1));

        drop(tx);
        assert_eq!(waiter.wait(Duration::from_secs(10)), Wake::Interrupted);
    }

    #[test]
    fn test_monotonic_clock() {
        let clock = MonotonicClock::new();
        let a = clock.now_us();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.now_us();
        assert!(b >= a + 2_000);
    }
}
