//! # Drive train
//!
//! Four wheel skid steer drive. The two left motors always get the same demand, as do the two
//! right motors.
//!
//! Arcade inputs (a speed and a rotation) are mixed into left/right demands with one of two
//! formulas, see [`ArcadeMix`]. While driving straight under the operator's override, arcade,
//! tank and stop commands are all discarded so the driver can't disturb a climb.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use hw_if::{actuator::Actuator, telemetry::TelemetrySink};
use util::maths::{clamp_unit, desaturate};

use crate::modules::{MotorGroup, Polarity};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_LEFT_DRIVE_MOTORS: &str = "leftDriveMotors";
pub const TM_LEFT_DRIVE_SPEED: &str = "leftDriveSpeed";
pub const TM_RIGHT_DRIVE_MOTORS: &str = "rightDriveMotors";
pub const TM_RIGHT_DRIVE_SPEED: &str = "rightDriveSpeed";
pub const TM_DRIVE_OVERRIDE: &str = "driveOverride";

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// The drive train is written by both the driver and operator tasks.
pub type SharedDriveTrain = Arc<Mutex<DriveTrain>>;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTrainParams {
    pub left_polarity: Polarity,
    pub right_polarity: Polarity,
}

pub struct DriveTrain {
    left: MotorGroup,
    right: MotorGroup,
    tm: Arc<dyn TelemetrySink>,
    params: DriveTrainParams,
    override_active: bool,
    output: DriveOutput,
}

/// Left and right demands last sent to the motors, before polarity correction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct DriveOutput {
    pub left: f64,
    pub right: f64,
    pub override_active: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Arcade mixing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcadeMix {
    /// Four quadrant mix, see [`custom_arcade_mix`].
    Custom,

    /// Linear mix, see [`reference_arcade_mix`].
    Reference,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Four quadrant arcade mix.
///
/// The outer wheel of a turn runs at the larger of speed and rotation, the inner wheel is slowed
/// by the rotation. Positive rotation turns left. Inputs are clamped to `[-1, 1]`.
pub fn custom_arcade_mix(speed: f64, rotation: f64) -> (f64, f64) {
    let s = clamp_unit(speed);
    let r = clamp_unit(rotation);

    if s > 0.0 {
        if r > 0.0 {
            (s - r, s.max(r))
        } else {
            (s.max(-r), s + r)
        }
    } else if r > 0.0 {
        (-(-s).max(r), s + r)
    } else {
        (s - r, -(-s).max(-r))
    }
}

/// Linear arcade mix, `left = s - r` and `right = s + r`, scaled back into `[-1, 1]` keeping
/// the ratio. Same rotation convention as [`custom_arcade_mix`].
pub fn reference_arcade_mix(speed: f64, rotation: f64) -> (f64, f64) {
    let s = clamp_unit(speed);
    let r = clamp_unit(rotation);

    desaturate(s - r, s + r)
}

/// Lock the shared drive train, ignoring poisoning since its state is plain data.
pub fn lock_drive(drive: &SharedDriveTrain) -> MutexGuard<'_, DriveTrain> {
    drive.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ArcadeMix {
    pub fn mix(self, speed: f64, rotation: f64) -> (f64, f64) {
        match self {
            ArcadeMix::Custom => custom_arcade_mix(speed, rotation),
            ArcadeMix::Reference => reference_arcade_mix(speed, rotation),
        }
    }

    /// Name shown on the dashboard.
    pub fn display_name(self) -> &'static str {
        match self {
            ArcadeMix::Custom => "stusArcadeWay",
            ArcadeMix::Reference => "wpisArcadeWay",
        }
    }
}

impl Default for DriveTrainParams {
    fn default() -> Self {
        Self {
            left_polarity: Polarity::Normal,
            right_polarity: Polarity::Inverted,
        }
    }
}

impl DriveTrain {
    /// Build the drive train from the left and right motor pairs.
    pub fn new(
        left: Vec<Arc<dyn Actuator>>,
        right: Vec<Arc<dyn Actuator>>,
        tm: Arc<dyn TelemetrySink>,
        params: DriveTrainParams,
    ) -> Self {
        tm.put_bool(TM_DRIVE_OVERRIDE, false);

        Self {
            left: MotorGroup::new(left, tm.clone(), TM_LEFT_DRIVE_SPEED, TM_LEFT_DRIVE_MOTORS),
            right: MotorGroup::new(right, tm.clone(), TM_RIGHT_DRIVE_SPEED, TM_RIGHT_DRIVE_MOTORS),
            tm,
            params,
            override_active: false,
            output: DriveOutput::default(),
        }
    }

    pub fn is_override(&self) -> bool {
        self.override_active
    }

    pub fn output(&self) -> DriveOutput {
        self.output
    }

    pub fn arcade_drive(&mut self, speed: f64, rotation: f64, mix: ArcadeMix) {
        if self.override_active {
            trace!("Drive override active, ignoring arcade");
            return;
        }

        let (left, right) = mix.mix(speed, rotation);
        self.set_speeds(left, right);
    }

    pub fn tank_drive(&mut self, left: f64, right: f64) {
        if self.override_active {
            trace!("Drive override active, ignoring tank");
            return;
        }

        self.set_speeds(clamp_unit(left), clamp_unit(right));
    }

    /// Drive straight at the given speed, locking out every other drive command until
    /// [`DriveTrain::stop_driving_straight`].
    pub fn drive_straight(&mut self, speed: f64) {
        if !self.override_active {
            debug!("Drive override on");
            self.set_override(true);
        }

        let s = clamp_unit(speed);
        self.set_speeds(s, s);
    }

    /// Release the override and stop.
    pub fn stop_driving_straight(&mut self) {
        if self.override_active {
            debug!("Drive override off");
        }

        self.set_override(false);
        self.set_speeds(0.0, 0.0);
    }

    pub fn stop(&mut self) {
        if self.override_active {
            return;
        }

        self.set_speeds(0.0, 0.0);
    }

    fn set_override(&mut self, active: bool) {
        self.override_active = active;
        self.tm.put_bool(TM_DRIVE_OVERRIDE, active);
    }

    fn set_speeds(&mut self, left: f64, right: f64) {
        self.output = DriveOutput {
            left,
            right,
            override_active: self.override_active,
        };

        self.left.set_speed(self.params.left_polarity.apply(left));
        self.right.set_speed(self.params.right_polarity.apply(right));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::{MemTelemetry, SimActuator};

    struct Rig {
        drive: DriveTrain,
        motors: Vec<Arc<SimActuator>>,
        tm: Arc<MemTelemetry>,
    }

    fn rig() -> Rig {
        let motors: Vec<Arc<SimActuator>> = (0..4)
            .map(|i| Arc::new(SimActuator::new(format!("drive{}", i), 1.0)))
            .collect();
        let tm = Arc::new(MemTelemetry::new());
        let drive = DriveTrain::new(
            vec![motors[0].clone(), motors[1].clone()],
            vec![motors[2].clone(), motors[3].clone()],
            tm.clone(),
            DriveTrainParams::default(),
        );

        Rig { drive, motors, tm }
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12
    }

    #[test]
    fn test_custom_mix_quadrants() {
        assert!(close(custom_arcade_mix(0.8, 0.3), (0.5, 0.8)));
        assert!(close(custom_arcade_mix(0.3, 0.8), (-0.5, 0.8)));
        assert!(close(custom_arcade_mix(0.8, -0.3), (0.8, 0.5)));
        assert!(close(custom_arcade_mix(-0.8, 0.3), (-0.8, -0.5)));
        assert!(close(custom_arcade_mix(-0.8, -0.3), (-0.5, -0.8)));
        assert!(close(custom_arcade_mix(0.0, 0.5), (-0.5, 0.5)));
        assert!(close(custom_arcade_mix(0.0, -0.5), (0.5, -0.5)));
        assert!(close(custom_arcade_mix(0.0, 0.0), (0.0, 0.0)));

        // Clamped inputs
        assert!(close(custom_arcade_mix(2.0, 0.0), (1.0, 1.0)));
    }

    #[test]
    fn test_reference_mix() {
        assert!(close(reference_arcade_mix(0.5, 0.0), (0.5, 0.5)));
        assert!(close(reference_arcade_mix(0.5, 0.25), (0.25, 0.75)));

        // Desaturated, ratio kept
        let (l, r) = reference_arcade_mix(1.0, 0.5);
        assert!(close((l, r), (1.0 / 3.0, 1.0)));

        // Turns the same way as the custom mix
        let (cl, cr) = custom_arcade_mix(0.6, 0.2);
        let (rl, rr) = reference_arcade_mix(0.6, 0.2);
        assert!(cr > cl && rr > rl);
    }

    #[test]
    fn test_polarity_and_telemetry() {
        let mut rig = rig();

        rig.drive.arcade_drive(0.5, 0.0, ArcadeMix::Custom);
        assert_eq!(rig.motors[0].output(), 0.5);
        assert_eq!(rig.motors[1].output(), 0.5);
        assert_eq!(rig.motors[2].output(), -0.5);
        assert_eq!(rig.motors[3].output(), -0.5);
        assert_eq!(rig.tm.number(TM_RIGHT_DRIVE_SPEED), Some(-0.5));
        assert_eq!(rig.tm.boolean(TM_LEFT_DRIVE_MOTORS), Some(true));
        assert_eq!(
            rig.drive.output(),
            DriveOutput {
                left: 0.5,
                right: 0.5,
                override_active: false
            }
        );

        rig.drive.tank_drive(0.2, -1.5);
        assert_eq!(rig.drive.output().right, -1.0);
    }

    #[test]
    fn test_override_precedence() {
        let mut rig = rig();

        rig.drive.drive_straight(-0.5);
        assert!(rig.drive.is_override());
        assert_eq!(rig.tm.boolean(TM_DRIVE_OVERRIDE), Some(true));
        assert_eq!(rig.motors[0].output(), -0.5);
        assert_eq!(rig.motors[2].output(), 0.5);

        // Everything else is ignored
        rig.drive.arcade_drive(1.0, 0.3, ArcadeMix::Custom);
        rig.drive.arcade_drive(1.0, 0.3, ArcadeMix::Reference);
        rig.drive.tank_drive(1.0, 1.0);
        rig.drive.stop();
        assert_eq!(rig.motors[0].output(), -0.5);
        assert_eq!(rig.drive.output().left, -0.5);

        // Straight can be updated under override
        rig.drive.drive_straight(-0.3);
        assert_eq!(rig.motors[1].output(), -0.3);

        rig.drive.stop_driving_straight();
        assert!(!rig.drive.is_override());
        assert_eq!(rig.motors[0].output(), 0.0);

        rig.drive.arcade_drive(1.0, 0.0, ArcadeMix::Custom);
        assert_eq!(rig.motors[0].output(), 1.0);
    }
}
