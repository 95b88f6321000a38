//! # Operator gamepad processing
//!
//! The operator runs the shooter (elevation, flywheels and feeder) and the hanging sequence.
//! Hanging needs confirmation from the driver before the robot is lifted, so the operator also
//! reads two buttons from the driver's gamepad.
//!
//! This task owns the [`Shooter`], nothing else commands it while teleop runs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::telemetry::TelemetrySink;
use util::time::Stopwatch;

use super::{
    gamepad::{Axis, Button, EdgeDetector, Gamepad},
    shaping,
};
use crate::chassis::Chassis;
use crate::drive_train::{lock_drive, SharedDriveTrain};
use crate::lifter::Lifter;
use crate::modules::feeder::FeederPosition;
use crate::prefs::Preferences;
use crate::sched::{PeriodicTask, TaskControl};
use crate::shooter::Shooter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_DOING_HANGING: &str = "doingHanging";
pub const TM_LIFT_ENABLED: &str = "liftEnabled";

const TM_HMI_ELEVATION_SPEED: &str = "hmiElevationSpeed";
const TM_HMI_SHOT_SPEED: &str = "hmiShotSpeed";
const TM_HMI_FEEDER_SPEED: &str = "hmiFeederSpeed";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Which controls do what on the operator's gamepad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorControls {
    pub elevation: Axis,
    pub feeder: Axis,
    pub shot_speed: Axis,

    pub kick_out: Button,
    pub fire: Button,
    pub auto_elevation: Button,
    pub latch: Button,
    pub lift: Button,

    /// Buttons on the driver's gamepad, either of which confirms the lift.
    pub lift_confirm: [Button; 2],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorParams {
    pub controls: OperatorControls,

    /// Manual elevation input is divided by this to slow the shooter down.
    pub elevation_divisor: f64,

    /// Flywheel speed when firing or ejecting, and the cap on the shot speed axis.
    pub shot_speed: f64,

    /// Time for the flywheels to spin up before the ball is fed in.
    pub shot_prep_s: f64,

    /// Feeder speed used to push the ball into the flywheels.
    pub feed_speed: f64,

    /// Feeder axis magnitude under which the POV hat positions the feeder.
    pub feeder_deadzone: f64,

    /// Scissor speed when first raising the hook.
    pub hang_speed: f64,

    /// Time to run at `hang_speed` before dropping to `hang_hold_speed`.
    pub hang_boost_s: f64,

    pub hang_hold_speed: f64,
    pub hang_release_speed: f64,

    /// Straight drive holding the robot against the tower while hanging.
    pub hang_drive_speed: f64,

    /// Straight drive while the winch lifts the robot.
    pub lift_drive_speed: f64,

    /// Time allowed for the shooter to reach home before auto elevation is switched off.
    pub home_settle_s: f64,
}

pub struct OperatorPad {
    pad: Gamepad,
    driver_pad: Gamepad,
    shooter: Shooter,
    chassis: Arc<Chassis>,
    lifter: Arc<Lifter>,
    drive: SharedDriveTrain,
    prefs: Preferences,
    tm: Arc<dyn TelemetrySink>,
    params: OperatorParams,

    state: OperatorState,
}

/// Processing state, reset at the start of every mode.
#[derive(Debug, Default)]
struct OperatorState {
    flatten: bool,

    auto_elevation_active: bool,
    auto_elevation_button: EdgeDetector,
    home_settle: Stopwatch,

    shot_timer: Stopwatch,
    feeder_position_active: bool,
    last_feeder_position: Option<FeederPosition>,

    hang_timer: Stopwatch,
    doing_hanging: bool,
    lift_enabled: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for OperatorControls {
    fn default() -> Self {
        Self {
            elevation: Axis::RightY,
            feeder: Axis::LeftY,
            shot_speed: Axis::RightTrigger,
            kick_out: Button::A,
            fire: Button::B,
            auto_elevation: Button::Y,
            latch: Button::LeftBumper,
            lift: Button::RightBumper,
            lift_confirm: [Button::LeftBumper, Button::RightBumper],
        }
    }
}

impl Default for OperatorParams {
    fn default() -> Self {
        Self {
            controls: OperatorControls::default(),
            elevation_divisor: 3.0,
            shot_speed: 1.0,
            shot_prep_s: 1.25,
            feed_speed: -1.0,
            feeder_deadzone: 0.15,
            hang_speed: 0.80,
            hang_boost_s: 2.0,
            hang_hold_speed: 0.35,
            hang_release_speed: 0.30,
            hang_drive_speed: -0.50,
            lift_drive_speed: -0.30,
            home_settle_s: 2.0,
        }
    }
}

impl OperatorPad {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pad: Gamepad,
        driver_pad: Gamepad,
        shooter: Shooter,
        chassis: Arc<Chassis>,
        lifter: Arc<Lifter>,
        drive: SharedDriveTrain,
        prefs: Preferences,
        tm: Arc<dyn TelemetrySink>,
        params: OperatorParams,
    ) -> Self {
        Self {
            pad,
            driver_pad,
            shooter,
            chassis,
            lifter,
            drive,
            prefs,
            tm,
            params,
            state: OperatorState::default(),
        }
    }

    pub fn shooter(&self) -> &Shooter {
        &self.shooter
    }

    /// Mutable access to the shooter, used by autonomous while teleop isn't running.
    pub fn shooter_mut(&mut self) -> &mut Shooter {
        &mut self.shooter
    }

    pub fn is_auto_elevation_active(&self) -> bool {
        self.state.auto_elevation_active
    }

    pub fn is_hanging(&self) -> bool {
        self.state.doing_hanging
    }

    pub fn is_lift_enabled(&self) -> bool {
        self.state.lift_enabled
    }

    fn set_doing_hanging(&mut self, hanging: bool) {
        self.state.doing_hanging = hanging;
        self.tm.put_bool(TM_DOING_HANGING, hanging);
    }

    fn set_lift_enabled(&mut self, enabled: bool) {
        self.state.lift_enabled = enabled;
        self.tm.put_bool(TM_LIFT_ENABLED, enabled);
    }

    // ---- ELEVATION ----

    fn process_elevation(&mut self) {
        let pressed = self.pad.button(self.params.controls.auto_elevation);

        if self.state.auto_elevation_button.rising(pressed) {
            if !self.state.auto_elevation_active {
                self.shooter.enable_auto_elevation();
                self.state.auto_elevation_active =
                    self.shooter.elevation().ctrl().is_automatic();
                self.state.home_settle.reset();
                info!(
                    "Auto elevation {}",
                    if self.state.auto_elevation_active {
                        "on"
                    } else {
                        "unavailable"
                    }
                );
            } else {
                info!("Auto elevation off, homing");
                self.state.auto_elevation_active = false;
                self.shooter.home_elevation();
                self.state.home_settle.start();
            }
        }

        // Wait for the shooter to get home before dropping the position loop
        if self.state.home_settle.is_running() {
            if self.state.home_settle.get() >= self.params.home_settle_s {
                debug!("Elevation home settled");
                self.state.home_settle.reset();
                self.shooter.disable_auto_elevation();
            } else {
                return;
            }
        }

        if self.state.auto_elevation_active {
            let distance = self.chassis.distance_to_tower();
            trace!("Distance to tower: {:.2}", distance);

            if distance > 0.0 {
                self.shooter.set_for_distance(distance);
            }
        } else {
            let speed = self.elevation_speed();
            self.shooter.adjust_elevation(speed);
        }
    }

    /// Manual elevation speed, positive raises the shooter.
    fn elevation_speed(&self) -> f64 {
        let raw = self.pad.axis(self.params.controls.elevation);
        self.tm.put_number(TM_HMI_ELEVATION_SPEED, raw);

        if self.pad.is_zero(raw) {
            return 0.0;
        }

        let shaped = if self.state.flatten {
            shaping::flatten(raw)
        } else {
            raw
        };

        -shaped / self.params.elevation_divisor
    }

    // ---- SHOOTING ----

    fn process_shooting(&mut self) {
        let controls = self.params.controls;
        let fire = self.pad.button(controls.fire);
        let kick_out = self.pad.button(controls.kick_out);
        trace!("Shooting: fire = {}, kick out = {}", fire, kick_out);

        if fire && !kick_out {
            if !self.state.shot_timer.is_running() {
                debug!("Shot started");
                self.state.shot_timer.start();
                self.shooter.shoot(self.params.shot_speed);
            } else if self.state.shot_timer.get() > self.params.shot_prep_s {
                self.drop_feeder_position();
                self.shooter.rotate_feeder(self.params.feed_speed);
            }
            return;
        }

        if kick_out && !fire {
            self.shooter.eject(self.params.shot_speed);
        } else {
            let shot_speed = self.shot_speed();
            self.shooter.shoot(shot_speed);
            self.process_feeder();
        }

        self.state.shot_timer.reset();
    }

    fn shot_speed(&self) -> f64 {
        let raw = self.pad.axis(self.params.controls.shot_speed);
        self.tm.put_number(TM_HMI_SHOT_SPEED, raw);

        if self.pad.is_zero(raw) {
            0.0
        } else {
            raw.min(self.params.shot_speed)
        }
    }

    /// Feeder speed, positive feeds the ball towards the flywheels.
    fn feeder_speed(&self) -> f64 {
        let raw = -self.pad.axis(self.params.controls.feeder);
        self.tm.put_number(TM_HMI_FEEDER_SPEED, raw);

        if self.pad.is_zero(raw) {
            0.0
        } else {
            -raw
        }
    }

    fn process_feeder(&mut self) {
        let speed = self.feeder_speed();

        if speed.abs() >= self.params.feeder_deadzone {
            trace!("Feeder speed {:.2}", speed);
            self.drop_feeder_position();
            self.shooter.rotate_feeder(speed);
            return;
        }

        match FeederPosition::from_pov(self.pad.pov()) {
            Some(position) => {
                if !self.state.feeder_position_active {
                    debug!("Feeder position control on");
                    self.shooter.rotate_feeder(0.0);
                    self.state.feeder_position_active = true;
                    self.shooter.enable_feeder_position();
                }

                if self.state.last_feeder_position != Some(position) {
                    debug!("Feeder position {:?}", position);
                    self.state.last_feeder_position = Some(position);
                    self.shooter.set_feeder_position(position);
                }
            }
            None => {
                if !self.state.feeder_position_active {
                    self.shooter.rotate_feeder(speed);
                }
            }
        }
    }

    fn drop_feeder_position(&mut self) {
        if self.state.feeder_position_active {
            debug!("Feeder position control off");
            self.state.feeder_position_active = false;
            self.state.last_feeder_position = None;
            self.shooter.disable_feeder_position();
        }
    }

    // ---- HANGING ----

    fn process_hanging(&mut self) {
        let controls = self.params.controls;
        let latch = self.pad.button(controls.latch);
        let lift = self.pad.button(controls.lift);
        let confirm = controls
            .lift_confirm
            .iter()
            .any(|b| self.driver_pad.button(*b));
        trace!(
            "Hanging: latch = {}, lift = {}, confirm = {}",
            latch,
            lift,
            confirm
        );

        if latch && !lift {
            if !self.state.hang_timer.is_running() {
                info!("Hanging started");
                self.state.hang_timer.start();
                self.set_doing_hanging(true);
                self.lifter.hang(self.params.hang_speed);
            } else if self.state.hang_timer.get() > self.params.hang_boost_s {
                self.lifter.hang(self.params.hang_hold_speed);
                lock_drive(&self.drive).drive_straight(self.params.hang_drive_speed);
            }
        } else if latch && lift {
            if !self.state.lift_enabled && confirm {
                info!("Lift confirmed by driver");
                self.set_lift_enabled(true);
            }

            if self.state.lift_enabled {
                self.lifter.lift_robot();
                self.lifter.hang(self.params.hang_hold_speed);
                lock_drive(&self.drive).drive_straight(self.params.lift_drive_speed);
            }
        } else if self.state.doing_hanging || self.state.lift_enabled {
            info!("Hanging released");
            self.state.hang_timer.reset();
            self.lifter.hang(self.params.hang_release_speed);
            self.lifter.stop_lift(false);
            lock_drive(&self.drive).stop_driving_straight();
            self.set_doing_hanging(false);
            self.set_lift_enabled(false);
        }
    }
}

impl PeriodicTask for OperatorPad {
    fn set_up(&mut self) {
        self.state = OperatorState {
            flatten: self.prefs.do_flatten_operator_input(),
            ..Default::default()
        };

        self.set_doing_hanging(false);
        self.set_lift_enabled(false);

        info!("Operator pad started");
    }

    fn do_it(&mut self) -> TaskControl {
        self.process_elevation();
        self.process_shooting();
        self.process_hanging();

        TaskControl::Continue
    }

    fn clean_up(&mut self) {
        lock_drive(&self.drive).stop_driving_straight();
        self.shooter.stop();
        self.lifter.reset();

        self.set_doing_hanging(false);
        self.set_lift_enabled(false);
    }
}
