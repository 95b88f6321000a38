//! # Periodic task scheduler
//!
//! Every control loop on the robot (driver input, operator input, sensors, match time, history)
//! is a [`PeriodicTask`] run in its own thread by a [`Scheduler`].
//!
//! The scheduler uses absolute deadlines. The `k`th deadline of a task started at `T0` with
//! period `P` is always `T0 + k*P`, however long each iteration took. A slow iteration eats into
//! the following sleep rather than pushing every later deadline out, and sleeps that round down
//! don't accumulate into drift.
//!
//! If an iteration leaves less than `min_loop_fraction` of the period before the next deadline
//! the sleep is skipped and a timing violation is logged. Violations never stop a task, they only
//! lower its effective rate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod clock;
pub mod registry;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc::{channel, Sender},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

use util::time::duration_to_micros;

use clock::{Clock, MonotonicClock, QuitWaiter, Wake, Waiter};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A unit of work run once per scheduler period.
pub trait PeriodicTask: Send + 'static {
    /// Called once in the task's thread before the first iteration.
    fn set_up(&mut self) {}

    /// The body of the loop.
    fn do_it(&mut self) -> TaskControl;

    /// Called once in the task's thread after the last iteration.
    fn clean_up(&mut self) {}
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Scheduler parameters, shared by all tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedParams {
    /// Fraction of the period below which the sleep before the next deadline is skipped and a
    /// timing violation reported.
    pub min_loop_fraction: f64,

    /// Emit periodic timing diagnostics at trace level.
    pub log_timing: bool,

    /// Number of loops between timing diagnostics.
    pub timing_log_interval: u64,
}

/// A task which has not been started yet.
///
/// Starting consumes the scheduler, so a task can't be started twice.
#[derive(Debug, Clone)]
pub struct Scheduler {
    name: String,
    period: Duration,
    params: SchedParams,
}

/// Handle on a running task.
///
/// Dropping the handle asks the task to quit without waiting for it.
pub struct TaskHandle<T> {
    name: String,
    quit_flag: Arc<AtomicBool>,
    quit_tx: Sender<()>,
    running: Arc<AtomicBool>,
    stats: Arc<LoopStats>,
    join_handle: Option<JoinHandle<T>>,
}

/// Counters published by a running loop.
#[derive(Debug, Default)]
pub struct LoopStats {
    loop_count: AtomicU64,
    missed_deadlines: AtomicU64,
}

/// Clears a task's running flag when its thread exits, including by a panic.
struct RunningGuard(Arc<AtomicBool>);

/// The state of a running loop, owned by the loop itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    start_us: u64,
    period_us: u64,
    next_deadline_us: u64,
    loop_count: u64,
    last_time_us: u64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// What a task wants to happen after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    Continue,
    Terminate,
}

#[derive(Debug, Error)]
pub enum SchedError {
    #[error("Task {0} must have a non-zero period")]
    ZeroPeriod(String),

    #[error("Could not spawn the thread for task {0}: {1}")]
    SpawnError(String, std::io::Error),

    #[error("Task {0} panicked")]
    TaskPanicked(String),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for SchedParams {
    fn default() -> Self {
        Self {
            min_loop_fraction: 0.10,
            log_timing: false,
            timing_log_interval: 20,
        }
    }
}

impl Scheduler {
    pub fn new<S: Into<String>>(name: S, period: Duration, params: SchedParams) -> Self {
        Self {
            name: name.into(),
            period,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start running the task in a new thread.
    pub fn start<T: PeriodicTask>(self, task: T) -> Result<TaskHandle<T>, SchedError> {
        if self.period == Duration::from_secs(0) {
            return Err(SchedError::ZeroPeriod(self.name));
        }

        let (quit_tx, quit_rx) = channel();
        let quit_flag = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(LoopStats::default());

        let thread_quit = quit_flag.clone();
        let thread_running = running.clone();
        let thread_stats = stats.clone();
        let name = self.name.clone();

        let join_handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let _running = RunningGuard(thread_running);
                let mut task = task;
                let clock = MonotonicClock::new();
                let mut waiter = QuitWaiter::new(quit_rx);

                info!(
                    "{} starting with period {} ms",
                    self.name,
                    self.period.as_millis()
                );

                task.set_up();
                run_loop(
                    &self.name,
                    &mut task,
                    self.period,
                    &self.params,
                    &clock,
                    &mut waiter,
                    &thread_quit,
                    &thread_stats,
                );
                task.clean_up();

                info!("{} stopped", self.name);

                task
            })
            .map_err(|e| SchedError::SpawnError(name.clone(), e))?;

        Ok(TaskHandle {
            name,
            quit_flag,
            quit_tx,
            running,
            stats,
            join_handle: Some(join_handle),
        })
    }
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the task to stop.
    ///
    /// Takes effect between iterations, an iteration in progress always runs to completion.
    pub fn quit(&self) {
        debug!("Quit requested for {}", self.name);
        self.quit_flag.store(true, Ordering::SeqCst);

        // The task may already have exited and dropped its receiver
        self.quit_tx.send(()).ok();
    }

    /// Whether the task's thread is still looping.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of completed iterations.
    pub fn loop_count(&self) -> u64 {
        self.stats.loop_count.load(Ordering::SeqCst)
    }

    /// Number of iterations which missed their deadline.
    pub fn missed_deadlines(&self) -> u64 {
        self.stats.missed_deadlines.load(Ordering::SeqCst)
    }

    /// Wait for the task to finish and take it back.
    ///
    /// This does not ask the task to quit, call [`TaskHandle::quit`] first unless the task
    /// terminates itself.
    pub fn join(mut self) -> Result<T, SchedError> {
        match self.join_handle.take() {
            Some(jh) => jh
                .join()
                .map_err(|_| SchedError::TaskPanicked(self.name.clone())),
            // Only taken here, and join consumes the handle
            None => Err(SchedError::TaskPanicked(self.name.clone())),
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if self.join_handle.is_some() {
            self.quit_flag.store(true, Ordering::SeqCst);
            self.quit_tx.send(()).ok();
        }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LoopState {
    pub fn new(start_us: u64, period_us: u64) -> Self {
        Self {
            start_us,
            period_us,
            next_deadline_us: start_us,
            loop_count: 0,
            last_time_us: start_us,
        }
    }

    /// Count a completed iteration and move the deadline on by exactly one period.
    pub fn advance(&mut self) -> u64 {
        self.loop_count += 1;
        self.next_deadline_us += self.period_us;
        self.next_deadline_us
    }

    /// Record an observation time, returning the time since the previous one.
    pub fn mark(&mut self, now_us: u64) -> u64 {
        let delta = now_us.saturating_sub(self.last_time_us);
        self.last_time_us = now_us;
        delta
    }

    /// The `k`th deadline of this loop.
    pub fn deadline(&self, k: u64) -> u64 {
        self.start_us + k * self.period_us
    }

    pub fn start_us(&self) -> u64 {
        self.start_us
    }

    pub fn next_deadline_us(&self) -> u64 {
        self.next_deadline_us
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the loop of a task until it terminates or is asked to quit.
///
/// Panics in the task body are not caught.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_loop<T, C, W>(
    name: &str,
    task: &mut T,
    period: Duration,
    params: &SchedParams,
    clock: &C,
    waiter: &mut W,
    quit: &AtomicBool,
    stats: &LoopStats,
) -> LoopState
where
    T: PeriodicTask + ?Sized,
    C: Clock + ?Sized,
    W: Waiter + ?Sized,
{
    let period_us = duration_to_micros(period);
    let min_sleep_us = (period_us as f64 * params.min_loop_fraction) as u64;

    let mut state = LoopState::new(clock.now_us(), period_us);

    while !quit.load(Ordering::SeqCst) {
        if task.do_it() == TaskControl::Terminate {
            debug!("{} terminated itself after {} loops", name, state.loop_count());
            break;
        }

        let deadline_us = state.advance();
        stats.loop_count.store(state.loop_count(), Ordering::SeqCst);

        let now_us = clock.now_us();
        let since_last_us = state.mark(now_us);

        if params.log_timing
            && state.loop_count() > 1
            && params.timing_log_interval > 0
            && state.loop_count() % params.timing_log_interval == 0
        {
            trace!(
                "{} @ {}: target {} us, real {} us, process {} us",
                name,
                state.loop_count(),
                period_us,
                deadline_us as i64 - now_us as i64,
                since_last_us as i64 - period_us as i64
            );
        }

        let sleep_us = deadline_us.saturating_sub(now_us);

        if sleep_us > min_sleep_us {
            if waiter.wait(Duration::from_micros(sleep_us)) == Wake::Interrupted {
                trace!("{} woken early", name);
            }
        } else {
            stats.missed_deadlines.fetch_add(1, Ordering::SeqCst);
            warn!(
                "Timing violation in {} @ {}: target {} us, real {} us",
                name,
                state.loop_count(),
                period_us,
                deadline_us as i64 - now_us as i64
            );
        }
    }

    state
}
