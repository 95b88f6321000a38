//! # Simulated hardware
//!
//! In-memory implementations of every hardware interface. These let the robot executable run on
//! a development machine, and give tests a way to drive inputs and observe outputs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::{
    actuator::{Actuator, ClosedLoopConfig, OpenLoopConfig},
    ds::{DriverStation, RobotMode},
    input::InputSource,
    telemetry::{TelemetrySink, TmValue},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// A simulated motor controller.
///
/// In closed loop the simulated mechanism tracks the setpoint perfectly, so the reported
/// position jumps straight to the commanded revolutions.
pub struct SimActuator {
    name: String,
    counts_per_rev: f64,
    state: Mutex<SimActuatorState>,
}

/// Snapshot of a simulated actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimActuatorState {
    pub control: SimControl,

    /// Last output demand, after the peak output limit for open loop
    pub output: f64,

    /// Feedback position in encoder counts
    pub position: i64,

    /// Number of `set_output` calls received
    pub num_commands: usize,
}

/// A simulated gamepad.
#[derive(Default)]
pub struct SimInput {
    state: Mutex<SimInputState>,
}

#[derive(Debug, Default, Clone)]
struct SimInputState {
    axes: HashMap<usize, f64>,
    buttons: HashMap<usize, bool>,
    povs: HashMap<usize, u16>,
}

/// A simulated driver station.
pub struct SimDriverStation {
    state: Mutex<SimDsState>,
}

#[derive(Debug, Clone)]
struct SimDsState {
    enabled: bool,
    mode: RobotMode,
    period_start: Instant,
    time_override: Option<f64>,
}

/// A telemetry sink which just remembers the last value of each key.
#[derive(Default)]
pub struct MemTelemetry {
    values: Mutex<HashMap<String, TmValue>>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Control mode of a simulated actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimControl {
    Unconfigured,
    OpenLoop(OpenLoopConfig),
    ClosedLoop(ClosedLoopConfig),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl SimActuator {
    pub fn new<S: Into<String>>(name: S, counts_per_rev: f64) -> Self {
        Self {
            name: name.into(),
            counts_per_rev,
            state: Mutex::new(SimActuatorState {
                control: SimControl::Unconfigured,
                output: 0.0,
                position: 0,
                num_commands: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> SimActuatorState {
        self.lock().clone()
    }

    pub fn output(&self) -> f64 {
        self.lock().output
    }

    pub fn control(&self) -> SimControl {
        self.lock().control
    }

    pub fn is_closed_loop(&self) -> bool {
        matches!(self.lock().control, SimControl::ClosedLoop(_))
    }

    pub fn num_commands(&self) -> usize {
        self.lock().num_commands
    }

    /// Move the simulated mechanism, as if pushed by hand.
    pub fn set_position(&self, counts: i64) {
        self.lock().position = counts;
    }

    fn lock(&self) -> MutexGuard<SimActuatorState> {
        lock(&self.state)
    }
}

impl Actuator for SimActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_output(&self, value: f64) {
        let counts_per_rev = self.counts_per_rev;
        let mut state = self.lock();

        state.num_commands += 1;

        match state.control {
            SimControl::OpenLoop(c) => {
                state.output = value.max(-c.peak_output).min(c.peak_output);
            }
            SimControl::ClosedLoop(_) => {
                state.output = value;
                state.position = (value * counts_per_rev).round() as i64;
            }
            SimControl::Unconfigured => {
                state.output = value;
            }
        }
    }

    fn configure_open_loop(&self, config: &OpenLoopConfig) {
        self.lock().control = SimControl::OpenLoop(*config);
    }

    fn configure_closed_loop(&self, config: &ClosedLoopConfig) {
        self.lock().control = SimControl::ClosedLoop(*config);
    }

    fn position(&self) -> i64 {
        self.lock().position
    }
}

impl SimInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_axis(&self, index: usize, value: f64) {
        lock(&self.state).axes.insert(index, value);
    }

    pub fn set_button(&self, index: usize, pressed: bool) {
        lock(&self.state).buttons.insert(index, pressed);
    }

    pub fn set_pov(&self, index: usize, angle: Option<u16>) {
        let mut state = lock(&self.state);
        match angle {
            Some(a) => state.povs.insert(index, a),
            None => state.povs.remove(&index),
        };
    }

    /// Release every button and centre every axis.
    pub fn clear(&self) {
        *lock(&self.state) = SimInputState::default();
    }
}

impl InputSource for SimInput {
    fn axis(&self, index: usize) -> f64 {
        lock(&self.state).axes.get(&index).copied().unwrap_or(0.0)
    }

    fn button(&self, index: usize) -> bool {
        lock(&self.state).buttons.get(&index).copied().unwrap_or(false)
    }

    fn pov(&self, index: usize) -> Option<u16> {
        lock(&self.state).povs.get(&index).copied()
    }
}

impl SimDriverStation {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimDsState {
                enabled: false,
                mode: RobotMode::Disabled,
                period_start: Instant::now(),
                time_override: None,
            }),
        }
    }

    /// Change mode, which restarts the match period clock.
    pub fn set_mode(&self, mode: RobotMode, enabled: bool) {
        let mut state = lock(&self.state);
        state.mode = mode;
        state.enabled = enabled;
        state.period_start = Instant::now();
    }

    /// Pin the reported match time, `None` goes back to wall time.
    pub fn set_match_time(&self, time_s: Option<f64>) {
        lock(&self.state).time_override = time_s;
    }
}

impl Default for SimDriverStation {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverStation for SimDriverStation {
    fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    fn mode(&self) -> RobotMode {
        lock(&self.state).mode
    }

    fn match_time_s(&self) -> f64 {
        let state = lock(&self.state);
        state
            .time_override
            .unwrap_or_else(|| state.period_start.elapsed().as_secs_f64())
    }
}

impl MemTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<TmValue> {
        lock(&self.values).get(key).cloned()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(TmValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(TmValue::Bool(b)) => Some(b),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(TmValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Copy of every published value.
    pub fn snapshot(&self) -> HashMap<String, TmValue> {
        lock(&self.values).clone()
    }
}

impl TelemetrySink for MemTelemetry {
    fn put_number(&self, key: &str, value: f64) {
        lock(&self.values).insert(key.into(), TmValue::Number(value));
    }

    fn put_bool(&self, key: &str, value: bool) {
        lock(&self.values).insert(key.into(), TmValue::Bool(value));
    }

    fn put_string(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.into(), TmValue::String(value.into()));
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Lock a mutex, ignoring poisoning. Simulated state is plain data so a panic part way through
/// an update can't leave it inconsistent in a way that matters.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actuator::{FeedbackSource, LoopGains};

    #[test]
    fn test_sim_actuator() {
        let act = SimActuator::new("feeder", 4096.0);
        assert_eq!(act.control(), SimControl::Unconfigured);

        act.configure_open_loop(&OpenLoopConfig { peak_output: 0.5 });
        act.set_output(0.8);
        assert_eq!(act.output(), 0.5);
        act.set_output(-0.25);
        assert_eq!(act.output(), -0.25);
        assert_eq!(act.position(), 0);

        act.configure_closed_loop(&ClosedLoopConfig {
            gains: LoopGains {
                k_p: 0.1,
                ..Default::default()
            },
            feedback: FeedbackSource::RelativeEncoder,
            peak_output: 0.33,
        });
        assert!(act.is_closed_loop());
        act.set_output(2.5);
        assert_eq!(act.position(), 10240);
        assert_eq!(act.num_commands(), 3);
    }

    #[test]
    fn test_sim_input() {
        let input = SimInput::new();
        assert_eq!(input.axis(1), 0.0);
        assert!(!input.button(3));
        assert_eq!(input.pov(0), None);

        input.set_axis(1, -0.5);
        input.set_button(3, true);
        input.set_pov(0, Some(90));
        assert_eq!(input.axis(1), -0.5);
        assert!(input.button(3));
        assert_eq!(input.pov(0), Some(90));

        input.set_pov(0, None);
        assert_eq!(input.pov(0), None);

        input.clear();
        assert!(!input.button(3));
    }

    #[test]
    fn test_mem_telemetry() {
        let tm = MemTelemetry::new();
        tm.put_number("feederSpeed", 0.25);
        tm.put_bool("pidRotation", true);
        tm.put_string("driveMode", "stusArcadeWay");

        assert_eq!(tm.number("feederSpeed"), Some(0.25));
        assert_eq!(tm.boolean("pidRotation"), Some(true));
        assert_eq!(tm.string("driveMode"), Some("stusArcadeWay".into()));
        assert_eq!(tm.number("pidRotation"), None);
        assert_eq!(tm.snapshot().len(), 3);
    }

    #[test]
    fn test_sim_driver_station() {
        let ds = SimDriverStation::new();
        assert!(!ds.is_enabled());
        assert_eq!(ds.mode(), RobotMode::Disabled);

        ds.set_mode(RobotMode::Teleoperated, true);
        ds.set_match_time(Some(42.0));
        assert!(ds.is_enabled());
        assert_eq!(ds.mode(), RobotMode::Teleoperated);
        assert_eq!(ds.match_time_s(), 42.0);
    }
}
