//! # Driver gamepad processing
//!
//! Arcade driving from the left stick (speed) and right stick (turn), plus manual winch
//! control from the triggers while the pit winch button is held.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::telemetry::TelemetrySink;

use super::{
    gamepad::{Axis, Button, Gamepad},
    shaping,
};
use crate::drive_train::{lock_drive, ArcadeMix, SharedDriveTrain};
use crate::lifter::Lifter;
use crate::prefs::Preferences;
use crate::sched::{PeriodicTask, TaskControl};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_DRIVE_MODE: &str = "driveMode";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Which controls do what on the driver's gamepad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverControls {
    pub speed: Axis,
    pub turn: Axis,
    pub winch_in: Axis,
    pub winch_out: Axis,
    pub winch_enable: Button,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverParams {
    pub controls: DriverControls,

    /// Scale applied to the triggers when pit winching.
    pub pit_winch_scale: f64,
}

pub struct DriverPad {
    pad: Gamepad,
    drive: SharedDriveTrain,
    lifter: Arc<Lifter>,
    prefs: Preferences,
    tm: Arc<dyn TelemetrySink>,
    params: DriverParams,

    mix: ArcadeMix,
    flatten: bool,
    pit_winch_enabled: bool,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for DriverControls {
    fn default() -> Self {
        Self {
            speed: Axis::LeftY,
            turn: Axis::RightX,
            winch_in: Axis::LeftTrigger,
            winch_out: Axis::RightTrigger,
            winch_enable: Button::Start,
        }
    }
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            controls: DriverControls::default(),
            pit_winch_scale: 0.15,
        }
    }
}

impl DriverPad {
    pub fn new(
        pad: Gamepad,
        drive: SharedDriveTrain,
        lifter: Arc<Lifter>,
        prefs: Preferences,
        tm: Arc<dyn TelemetrySink>,
        params: DriverParams,
    ) -> Self {
        Self {
            pad,
            drive,
            lifter,
            prefs,
            tm,
            params,
            mix: ArcadeMix::Custom,
            flatten: false,
            pit_winch_enabled: false,
        }
    }

    pub fn mix(&self) -> ArcadeMix {
        self.mix
    }

    /// Deadband, then optionally flatten, a stick input.
    fn shape(&self, raw: f64) -> f64 {
        if self.pad.is_zero(raw) {
            0.0
        } else if self.flatten {
            shaping::flatten(raw)
        } else {
            raw
        }
    }

    fn process_driving(&mut self) {
        let controls = &self.params.controls;

        let raw_speed = self.pad.axis(controls.speed);
        let raw_turn = self.pad.axis(controls.turn);
        self.tm.put_number("hmiSpeed", raw_speed);
        self.tm.put_number("hmiTurn", raw_turn);

        // Sticks read negative when pushed forward and right
        let speed = -self.shape(raw_speed);
        let turn = -self.shape(raw_turn);
        self.tm.put_number("speed", speed);
        self.tm.put_number("turn", turn);

        let mut drive = lock_drive(&self.drive);

        if self.pad.is_zero(speed) && self.pad.is_zero(turn) {
            drive.stop();
        } else {
            drive.arcade_drive(speed, turn, self.mix);
        }
    }

    fn process_pit_winch(&mut self) {
        let controls = &self.params.controls;
        let enabled = self.pad.button(controls.winch_enable);

        if enabled != self.pit_winch_enabled {
            debug!("Pit winch {}", if enabled { "enabled" } else { "disabled" });
            self.pit_winch_enabled = enabled;

            if !enabled {
                self.lifter.pit_winch(0.0, 0.0);
            }
        }

        if !self.pit_winch_enabled {
            return;
        }

        let wind_in = self.shape(self.pad.axis(controls.winch_in)) * self.params.pit_winch_scale;
        let wind_out = self.shape(self.pad.axis(controls.winch_out)) * self.params.pit_winch_scale;
        trace!("Pit winch: in = {:.2}, out = {:.2}", wind_in, wind_out);

        self.lifter.pit_winch(wind_in, wind_out);
    }
}

impl PeriodicTask for DriverPad {
    fn set_up(&mut self) {
        self.mix = if self.prefs.use_stu_drive_mode() {
            ArcadeMix::Custom
        } else {
            ArcadeMix::Reference
        };
        self.flatten = self.prefs.do_flatten_driver_input();
        self.pit_winch_enabled = false;

        self.tm.put_string(TM_DRIVE_MODE, self.mix.display_name());
        info!(
            "Driver pad started, {} mix, flattening {}",
            self.mix.display_name(),
            if self.flatten { "on" } else { "off" }
        );
    }

    fn do_it(&mut self) -> TaskControl {
        self.process_driving();
        self.process_pit_winch();

        TaskControl::Continue
    }

    fn clean_up(&mut self) {
        lock_drive(&self.drive).stop();

        if self.pit_winch_enabled {
            self.lifter.pit_winch(0.0, 0.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_train::{DriveTrain, DriveTrainParams};
    use crate::modules::{
        scissor_lift::{ScissorLift, ScissorLiftParams},
        winch::{Winch, WinchParams},
    };
    use crate::ophmi::gamepad::{GamepadLayouts, GamepadModel};
    use hw_if::prefs::{MapPreferences, PrefValue};
    use hw_if::sim::{MemTelemetry, SimActuator, SimInput};
    use std::sync::Mutex;

    struct Rig {
        driver: DriverPad,
        input: Arc<SimInput>,
        drive: SharedDriveTrain,
        winch: Arc<SimActuator>,
        tm: Arc<MemTelemetry>,
    }

    fn rig(prefs: &[(&str, bool)]) -> Rig {
        let tm = Arc::new(MemTelemetry::new());
        let input = Arc::new(SimInput::new());
        let pad = Gamepad::new(
            input.clone(),
            GamepadLayouts::default().layout(GamepadModel::Xbox360),
            shaping::DEFAULT_DEADBAND,
        );

        let drive = Arc::new(Mutex::new(DriveTrain::new(
            vec![Arc::new(SimActuator::new("l", 1.0))],
            vec![Arc::new(SimActuator::new("r", 1.0))],
            tm.clone(),
            DriveTrainParams::default(),
        )));

        let winch = Arc::new(SimActuator::new("winch", 1.0));
        let lifter = Arc::new(Lifter::new(
            Winch::new(
                vec![winch.clone()],
                vec![],
                tm.clone(),
                WinchParams::default(),
            ),
            ScissorLift::new(
                Arc::new(SimActuator::new("scissor", 1.0)),
                tm.clone(),
                ScissorLiftParams::default(),
            ),
        ));

        let map = MapPreferences::new();
        for (k, v) in prefs {
            map.set(*k, PrefValue::Bool(*v));
        }

        let mut driver = DriverPad::new(
            pad,
            drive.clone(),
            lifter,
            Preferences::new(Arc::new(map)),
            tm.clone(),
            DriverParams::default(),
        );
        driver.set_up();

        Rig {
            driver,
            input,
            drive,
            winch,
            tm,
        }
    }

    #[test]
    fn test_arcade_from_sticks() {
        let mut rig = rig(&[]);
        assert_eq!(rig.driver.mix(), ArcadeMix::Custom);
        assert_eq!(rig.tm.string(TM_DRIVE_MODE), Some("stusArcadeWay".into()));

        // Full forward
        rig.input.set_axis(1, -1.0);
        rig.driver.do_it();
        let out = lock_drive(&rig.drive).output();
        assert_eq!((out.left, out.right), (1.0, 1.0));

        // Inside the deadband stops
        rig.input.set_axis(1, 0.02);
        rig.input.set_axis(4, -0.04);
        rig.driver.do_it();
        let out = lock_drive(&rig.drive).output();
        assert_eq!((out.left, out.right), (0.0, 0.0));

        // Turning on the spot
        rig.input.set_axis(1, 0.0);
        rig.input.set_axis(4, -0.5);
        rig.driver.do_it();
        let out = lock_drive(&rig.drive).output();
        assert_eq!((out.left, out.right), (-0.5, 0.5));
    }

    #[test]
    fn test_reference_mix_and_flattening() {
        let mut rig = rig(&[("useStuDriveMode", false), ("doFlattenDriverInput", true)]);
        assert_eq!(rig.driver.mix(), ArcadeMix::Reference);
        assert_eq!(rig.tm.string(TM_DRIVE_MODE), Some("wpisArcadeWay".into()));

        rig.input.set_axis(1, -0.5);
        rig.driver.do_it();
        let out = lock_drive(&rig.drive).output();
        let expected = shaping::flatten(0.5);
        assert!((out.left - expected).abs() < 1e-12);
        assert!((out.right - expected).abs() < 1e-12);
    }

    #[test]
    fn test_override_respected() {
        let mut rig = rig(&[]);

        lock_drive(&rig.drive).drive_straight(-0.3);
        rig.input.set_axis(1, -1.0);
        rig.driver.do_it();
        assert_eq!(lock_drive(&rig.drive).output().left, -0.3);

        rig.input.clear();
        rig.driver.do_it();
        assert_eq!(lock_drive(&rig.drive).output().left, -0.3);
    }

    #[test]
    fn test_pit_winch() {
        let mut rig = rig(&[]);

        // Triggers do nothing without the enable button
        rig.input.set_axis(2, 1.0);
        rig.driver.do_it();
        assert_eq!(rig.winch.num_commands(), 0);

        rig.input.set_button(8, true);
        rig.driver.do_it();
        assert!((rig.winch.output() - 0.15).abs() < 1e-12);

        rig.input.set_axis(3, 0.5);
        rig.driver.do_it();
        assert!((rig.winch.output() + 0.075).abs() < 1e-12);

        // Releasing the enable button stops the winch
        rig.input.set_button(8, false);
        rig.driver.do_it();
        assert_eq!(rig.winch.output(), 0.0);
    }
}
