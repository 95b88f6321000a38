//! # Feeder rotation module
//!
//! The feeder is a flap which rotates about the shooter to pick up and feed balls. Manually it's
//! driven at a scaled speed. In automatic mode it's moved between eight named positions by the
//! actuator's closed loop, always taking the shortest way round.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::{
    actuator::{Actuator, ClosedLoopConfig, FeedbackSource, LoopGains, OpenLoopConfig},
    telemetry::TelemetrySink,
};
use util::maths::rem_euclid;

use super::{MotorGroup, Polarity, PositionCtrl};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_FEEDER_MOTOR: &str = "feederMotor";
pub const TM_FEEDER_SPEED: &str = "feederSpeed";
pub const TM_PID_ROTATION: &str = "pidRotation";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederParams {
    /// Scale applied to manual speed demands.
    pub speed_scale: f64,

    /// Gearbox ratio between the motor and the flap.
    pub motor_revs_per_flap_rev: f64,

    /// Encoder counts per motor revolution.
    pub counts_per_motor_rev: f64,

    pub polarity: Polarity,

    pub manual: OpenLoopConfig,

    pub automatic: ClosedLoopConfig,
}

pub struct FeederModule {
    ctrl: PositionCtrl,
    motor: MotorGroup,
    tm: Arc<dyn TelemetrySink>,
    params: FeederParams,
    position: Option<FeederPosition>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Named feeder positions, clockwise from straight up in eighths of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeederPosition {
    Up,
    UpFront,
    Front,
    DownFront,
    Down,
    DownRear,
    Rear,
    UpRear,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed change in revolutions to get from `current` to `target`, both fractions of a turn in
/// `[0, 1)`, going whichever way round is shorter.
///
/// Positive is the direction of increasing position. Equal distances go the direct way.
pub fn shortest_path_delta(current: f64, target: f64) -> f64 {
    let direct = target - current;
    let wrapped = if direct > 0.0 {
        direct - 1.0
    } else {
        direct + 1.0
    };

    if direct.abs() <= wrapped.abs() {
        direct
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl FeederPosition {
    pub const ALL: [FeederPosition; 8] = [
        FeederPosition::Up,
        FeederPosition::UpFront,
        FeederPosition::Front,
        FeederPosition::DownFront,
        FeederPosition::Down,
        FeederPosition::DownRear,
        FeederPosition::Rear,
        FeederPosition::UpRear,
    ];

    /// Position as a fraction of a flap revolution.
    pub fn revolutions(self) -> f64 {
        match self {
            FeederPosition::Up => 0.0,
            FeederPosition::UpFront => 0.125,
            FeederPosition::Front => 0.25,
            FeederPosition::DownFront => 0.375,
            FeederPosition::Down => 0.5,
            FeederPosition::DownRear => 0.625,
            FeederPosition::Rear => 0.75,
            FeederPosition::UpRear => 0.875,
        }
    }

    /// Map a POV hat angle onto a position, `None` for released or in-between angles.
    pub fn from_pov(angle: Option<u16>) -> Option<Self> {
        match angle? {
            0 => Some(FeederPosition::Up),
            45 => Some(FeederPosition::UpFront),
            90 => Some(FeederPosition::Front),
            135 => Some(FeederPosition::DownFront),
            180 => Some(FeederPosition::Down),
            225 => Some(FeederPosition::DownRear),
            270 => Some(FeederPosition::Rear),
            315 => Some(FeederPosition::UpRear),
            _ => None,
        }
    }
}

impl Default for FeederParams {
    fn default() -> Self {
        Self {
            speed_scale: 0.35,
            motor_revs_per_flap_rev: 163.6,
            counts_per_motor_rev: 4096.0,
            polarity: Polarity::Normal,
            manual: OpenLoopConfig { peak_output: 0.5 },
            automatic: ClosedLoopConfig {
                gains: LoopGains {
                    k_p: 0.1,
                    ..Default::default()
                },
                feedback: FeedbackSource::RelativeEncoder,
                peak_output: 0.33,
            },
        }
    }
}

impl FeederModule {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        params: FeederParams,
        auto_allowed: bool,
    ) -> Self {
        let motor = MotorGroup::single(actuator, tm.clone(), TM_FEEDER_SPEED, TM_FEEDER_MOTOR);

        let module = Self {
            ctrl: PositionCtrl::new("Feeder", 0.0, auto_allowed),
            motor,
            tm,
            params,
            position: None,
        };

        module.motor.configure_open_loop(&module.params.manual);
        module.tm.put_bool(TM_PID_ROTATION, false);

        module
    }

    pub fn ctrl(&self) -> &PositionCtrl {
        &self.ctrl
    }

    /// The last position commanded in automatic mode.
    pub fn position(&self) -> Option<FeederPosition> {
        self.position
    }

    /// Current flap angle in revolutions, from the actuator's feedback.
    pub fn flap_revolutions(&self) -> f64 {
        let counts = self.motor.lead().map(|a| a.position()).unwrap_or(0);

        counts as f64 / self.params.counts_per_motor_rev / self.params.motor_revs_per_flap_rev
    }

    pub fn enable_automatic(&mut self) {
        if !self.ctrl.enable_automatic() {
            return;
        }

        self.motor.set_speed(0.0);
        self.position = None;
        self.tm.put_bool(TM_PID_ROTATION, true);
        self.motor.set_running(true);
        self.motor.configure_closed_loop(&self.params.automatic);
    }

    pub fn disable_automatic(&mut self) {
        self.ctrl.disable_automatic();
        self.position = None;
        self.tm.put_bool(TM_PID_ROTATION, false);
        self.motor.set_running(false);
        self.motor.configure_open_loop(&self.params.manual);
    }

    /// Move to a named position by the shortest route.
    pub fn set_position(&mut self, position: FeederPosition) {
        if !self.ctrl.is_automatic() {
            warn!("Feeder not in automatic mode, ignoring move to {:?}", position);
            return;
        }

        if !self.ctrl.accept_target(position.revolutions()) {
            return;
        }

        let current = self.flap_revolutions();
        let partial = rem_euclid(current, 1.0);
        let delta = shortest_path_delta(partial, position.revolutions());
        let target = current + delta;

        debug!(
            "Feeder to {:?}: at {:.3} flap revs, moving {:+.3} to {:.3}",
            position, current, delta, target
        );

        self.position = Some(position);
        self.motor
            .set_output(target * self.params.motor_revs_per_flap_rev);
    }

    /// Manual rotation, positive feeds a ball into the shooter.
    pub fn adjust(&mut self, speed: f64) {
        if !self.ctrl.allows_manual() {
            return;
        }

        let speed = speed * self.params.speed_scale;
        self.motor.set_speed(self.params.polarity.apply(speed));
    }

    /// Back to manual and stationary.
    pub fn stop(&mut self) {
        self.ctrl.stop();
        self.position = None;
        self.tm.put_bool(TM_PID_ROTATION, false);
        self.motor.configure_open_loop(&self.params.manual);
        self.motor.set_speed(0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::{MemTelemetry, SimActuator, SimControl};

    fn feeder(auto_allowed: bool) -> (FeederModule, Arc<SimActuator>, Arc<MemTelemetry>) {
        let act = Arc::new(SimActuator::new("feeder", 4096.0));
        let tm = Arc::new(MemTelemetry::new());
        let module = FeederModule::new(
            act.clone(),
            tm.clone(),
            FeederParams::default(),
            auto_allowed,
        );
        (module, act, tm)
    }

    #[test]
    fn test_shortest_path() {
        // Across the wrap
        assert!((shortest_path_delta(0.9, 0.1) - 0.2).abs() < 1e-12);
        assert!((shortest_path_delta(0.1, 0.9) + 0.2).abs() < 1e-12);

        // Direct
        assert!((shortest_path_delta(0.25, 0.5) - 0.25).abs() < 1e-12);
        assert!((shortest_path_delta(0.75, 0.5) + 0.25).abs() < 1e-12);
        assert_eq!(shortest_path_delta(0.5, 0.5), 0.0);

        // Half a turn either way goes direct
        assert_eq!(shortest_path_delta(0.0, 0.5), 0.5);
        assert_eq!(shortest_path_delta(0.5, 0.0), -0.5);

        for &c in &[0.0, 0.1, 0.3, 0.6, 0.99] {
            for p in FeederPosition::ALL.iter() {
                assert!(shortest_path_delta(c, p.revolutions()).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn test_positions() {
        assert_eq!(FeederPosition::Down.revolutions(), 0.5);
        assert_eq!(FeederPosition::from_pov(Some(135)), Some(FeederPosition::DownFront));
        assert_eq!(FeederPosition::from_pov(Some(10)), None);
        assert_eq!(FeederPosition::from_pov(None), None);

        for (i, p) in FeederPosition::ALL.iter().enumerate() {
            assert_eq!(p.revolutions(), i as f64 / 8.0);
        }
    }

    #[test]
    fn test_set_position_across_wrap() {
        let (mut feeder, act, tm) = feeder(true);

        // Sat at 2.9 flap revs
        let counts = (2.9 * 163.6 * 4096.0f64).round() as i64;
        act.set_position(counts);

        feeder.enable_automatic();
        assert!(act.is_closed_loop());
        assert_eq!(tm.boolean(TM_PID_ROTATION), Some(true));

        feeder.set_position(FeederPosition::UpFront);
        let flap = act.output() / 163.6;
        assert!((flap - 3.125).abs() < 1e-4);
        assert_eq!(feeder.position(), Some(FeederPosition::UpFront));

        // Same position again is ignored
        let n = act.num_commands();
        feeder.set_position(FeederPosition::UpFront);
        assert_eq!(act.num_commands(), n);
    }

    #[test]
    fn test_manual_mode() {
        let (mut feeder, act, tm) = feeder(true);

        // Positions need automatic mode
        feeder.set_position(FeederPosition::Front);
        assert_eq!(act.num_commands(), 0);

        feeder.adjust(1.0);
        assert!((act.output() - 0.35).abs() < 1e-12);
        assert_eq!(tm.boolean(TM_FEEDER_MOTOR), Some(true));

        // Manual speed is ignored in automatic mode
        feeder.enable_automatic();
        let n = act.num_commands();
        feeder.adjust(0.5);
        assert_eq!(act.num_commands(), n);

        feeder.stop();
        assert!(!feeder.ctrl().is_automatic());
        assert_eq!(
            act.control(),
            SimControl::OpenLoop(FeederParams::default().manual)
        );
        assert_eq!(act.output(), 0.0);
    }

    #[test]
    fn test_automatic_disallowed() {
        let (mut feeder, act, _) = feeder(false);

        feeder.enable_automatic();
        assert!(!act.is_closed_loop());
        assert!(!feeder.ctrl().is_automatic());
    }
}
