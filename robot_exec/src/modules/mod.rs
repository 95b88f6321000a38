//! # Mechanism modules
//!
//! A module drives one mechanism on the robot through one or more actuators. Simple modules
//! (shooter wheels, winch, scissor lift) are speed only. Position modules (feeder, elevation)
//! add an automatic positional mode on top of manual speed control, tracked by a
//! [`PositionCtrl`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod elevation;
pub mod feeder;
pub mod scissor_lift;
pub mod shooter_wheels;
pub mod winch;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::{
    actuator::{Actuator, ClosedLoopConfig, OpenLoopConfig},
    telemetry::TelemetrySink,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speed demands smaller than this are reported as the motor not running.
pub const ZERO_SPEED_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// A group of actuators always commanded identically, with their telemetry keys.
#[derive(Clone)]
pub struct MotorGroup {
    actuators: Vec<Arc<dyn Actuator>>,
    tm: Arc<dyn TelemetrySink>,
    speed_key: &'static str,
    running_key: &'static str,
}

/// Mode and setpoint of a position module.
#[derive(Debug, Clone)]
pub struct PositionCtrl {
    name: &'static str,
    mode: CtrlMode,
    setpoint: Option<f64>,
    hysteresis: f64,
    auto_allowed: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlMode {
    Manual,
    Automatic,
}

/// Wiring polarity of a motor, so that positive demands always mean the same thing to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Normal,
    Inverted,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

pub fn ensure_positive(speed: f64) -> f64 {
    speed.abs()
}

pub fn ensure_negative(speed: f64) -> f64 {
    -speed.abs()
}

pub fn is_zero(speed: f64) -> bool {
    speed.abs() < ZERO_SPEED_TOLERANCE
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Polarity {
    pub fn apply(self, speed: f64) -> f64 {
        match self {
            Polarity::Normal => speed,
            Polarity::Inverted => -speed,
        }
    }
}

impl Default for Polarity {
    fn default() -> Self {
        Polarity::Normal
    }
}

impl MotorGroup {
    pub fn new(
        actuators: Vec<Arc<dyn Actuator>>,
        tm: Arc<dyn TelemetrySink>,
        speed_key: &'static str,
        running_key: &'static str,
    ) -> Self {
        Self {
            actuators,
            tm,
            speed_key,
            running_key,
        }
    }

    pub fn single(
        actuator: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        speed_key: &'static str,
        running_key: &'static str,
    ) -> Self {
        Self::new(vec![actuator], tm, speed_key, running_key)
    }

    /// Command every actuator in the group and publish the demand.
    pub fn set_speed(&self, speed: f64) {
        self.tm.put_number(self.speed_key, speed);
        self.set_running(!is_zero(speed));

        for a in &self.actuators {
            a.set_output(speed);
        }
    }

    /// Send a raw output (closed loop setpoint) without touching the speed telemetry.
    pub fn set_output(&self, value: f64) {
        for a in &self.actuators {
            a.set_output(value);
        }
    }

    pub fn set_running(&self, running: bool) {
        self.tm.put_bool(self.running_key, running);
    }

    /// The first actuator, which carries the feedback sensor.
    pub fn lead(&self) -> Option<&Arc<dyn Actuator>> {
        self.actuators.first()
    }

    pub fn configure_open_loop(&self, config: &OpenLoopConfig) {
        for a in &self.actuators {
            a.configure_open_loop(config);
        }
    }

    pub fn configure_closed_loop(&self, config: &ClosedLoopConfig) {
        for a in &self.actuators {
            a.configure_closed_loop(config);
        }
    }
}

impl PositionCtrl {
    pub fn new(name: &'static str, hysteresis: f64, auto_allowed: bool) -> Self {
        Self {
            name,
            mode: CtrlMode::Manual,
            setpoint: None,
            hysteresis,
            auto_allowed,
        }
    }

    pub fn mode(&self) -> CtrlMode {
        self.mode
    }

    pub fn is_automatic(&self) -> bool {
        self.mode == CtrlMode::Automatic
    }

    pub fn setpoint(&self) -> Option<f64> {
        self.setpoint
    }

    /// Switch to automatic mode, clearing the setpoint.
    ///
    /// Returns false, leaving the mode unchanged, if the preferences don't allow automatic mode.
    pub fn enable_automatic(&mut self) -> bool {
        if !self.auto_allowed {
            warn!("{}: automatic mode not enabled in preferences", self.name);
            return false;
        }

        debug!("{}: automatic mode enabled", self.name);
        self.mode = CtrlMode::Automatic;
        self.setpoint = None;
        true
    }

    /// Switch back to manual mode, clearing the setpoint.
    pub fn disable_automatic(&mut self) {
        debug!("{}: automatic mode disabled", self.name);
        self.mode = CtrlMode::Manual;
        self.setpoint = None;
    }

    /// Decide whether a new target should be applied, recording it as the setpoint if so.
    ///
    /// Targets are ignored in manual mode, and when within the hysteresis of the current
    /// setpoint. The first target after the setpoint is cleared is always applied.
    pub fn accept_target(&mut self, target: f64) -> bool {
        if self.mode != CtrlMode::Automatic {
            trace!("{}: not automatic, ignoring target {:.3}", self.name, target);
            return false;
        }

        if let Some(sp) = self.setpoint {
            if (target - sp).abs() <= self.hysteresis {
                trace!("{}: already at {:.3}, ignoring {:.3}", self.name, sp, target);
                return false;
            }
        }

        self.setpoint = Some(target);
        true
    }

    /// Whether manual speed demands should be passed on.
    pub fn allows_manual(&self) -> bool {
        if self.mode == CtrlMode::Automatic {
            trace!("{}: automatic, ignoring manual demand", self.name);
            false
        } else {
            true
        }
    }

    pub fn clear_setpoint(&mut self) {
        self.setpoint = None;
    }

    /// Drop to manual mode. Always allowed.
    pub fn stop(&mut self) {
        self.mode = CtrlMode::Manual;
        self.setpoint = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hysteresis_gate() {
        let mut ctrl = PositionCtrl::new("test", 0.5, true);

        // Manual mode ignores targets
        assert!(!ctrl.accept_target(10.0));
        assert_eq!(ctrl.setpoint(), None);

        assert!(ctrl.enable_automatic());
        assert!(ctrl.accept_target(10.0));
        assert!(!ctrl.accept_target(10.3));
        assert!(!ctrl.accept_target(9.5));
        assert!(ctrl.accept_target(10.6));
        assert_eq!(ctrl.setpoint(), Some(10.6));
    }

    #[test]
    fn test_first_target_after_enable() {
        let mut ctrl = PositionCtrl::new("test", 100.0, true);

        ctrl.enable_automatic();
        assert!(ctrl.accept_target(1.0));

        // Re-enabling clears the setpoint, so even an identical target goes through
        ctrl.enable_automatic();
        assert_eq!(ctrl.setpoint(), None);
        assert!(ctrl.accept_target(1.0));
    }

    #[test]
    fn test_automatic_not_allowed() {
        let mut ctrl = PositionCtrl::new("test", 0.0, false);

        assert!(!ctrl.enable_automatic());
        assert_eq!(ctrl.mode(), CtrlMode::Manual);
        assert!(ctrl.allows_manual());
    }

    #[test]
    fn test_stop_and_disable() {
        let mut ctrl = PositionCtrl::new("test", 0.0, true);

        ctrl.enable_automatic();
        ctrl.accept_target(3.0);
        assert!(!ctrl.allows_manual());

        ctrl.disable_automatic();
        assert_eq!(ctrl.mode(), CtrlMode::Manual);
        assert_eq!(ctrl.setpoint(), None);

        ctrl.enable_automatic();
        ctrl.accept_target(3.0);
        ctrl.stop();
        assert!(!ctrl.is_automatic());
        assert_eq!(ctrl.setpoint(), None);
    }

    #[test]
    fn test_speed_helpers() {
        assert_eq!(ensure_positive(-0.4), 0.4);
        assert_eq!(ensure_negative(0.4), -0.4);
        assert_eq!(Polarity::Inverted.apply(0.2), -0.2);
        assert_eq!(Polarity::Normal.apply(0.2), 0.2);
        assert!(is_zero(0.005));
        assert!(!is_zero(-0.02));
    }
}
