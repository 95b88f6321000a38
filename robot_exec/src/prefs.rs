//! # Robot preferences
//!
//! Typed access to the runtime preferences. Every preference has a documented default which is
//! used when the preference is missing (see [`hw_if::prefs::PreferencesSource`]).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use hw_if::prefs::PreferencesSource;

use crate::ophmi::gamepad::GamepadModel;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const USE_STU_DRIVE_MODE: &str = "useStuDriveMode";
pub const DO_FLATTEN_DRIVER_INPUT: &str = "doFlattenDriverInput";
pub const DO_FLATTEN_OPERATOR_INPUT: &str = "doFlattenOperatorInput";
pub const RUN_AUTONOMOUS: &str = "runAutonomous";
pub const USE_AUTO_ELEVATION: &str = "useAutoElevation";
pub const USE_PID_FEEDER_ROTATION: &str = "usePIDFeederRotation";
pub const DRIVER_CONTROLLER: &str = "driverController";
pub const OPERATOR_CONTROLLER: &str = "operatorController";
pub const RUN_SENSORS_THREAD: &str = "runSensorsThread";
pub const RUN_THREAD_TIMING: &str = "runThreadTiming";

const DEFAULT_CONTROLLER: &str = "Xbox360Gamepad";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Typed preferences, cheap to clone.
#[derive(Clone)]
pub struct Preferences {
    source: Arc<dyn PreferencesSource>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Preferences {
    pub fn new(source: Arc<dyn PreferencesSource>) -> Self {
        Self { source }
    }

    /// Use the custom arcade mix rather than the reference mix.
    pub fn use_stu_drive_mode(&self) -> bool {
        self.source.get_bool(USE_STU_DRIVE_MODE, true)
    }

    pub fn do_flatten_driver_input(&self) -> bool {
        self.source.get_bool(DO_FLATTEN_DRIVER_INPUT, false)
    }

    pub fn do_flatten_operator_input(&self) -> bool {
        self.source.get_bool(DO_FLATTEN_OPERATOR_INPUT, false)
    }

    pub fn run_autonomous(&self) -> bool {
        self.source.get_bool(RUN_AUTONOMOUS, false)
    }

    pub fn use_auto_elevation(&self) -> bool {
        self.source.get_bool(USE_AUTO_ELEVATION, false)
    }

    pub fn use_pid_feeder_rotation(&self) -> bool {
        self.source.get_bool(USE_PID_FEEDER_ROTATION, false)
    }

    pub fn driver_controller(&self) -> GamepadModel {
        GamepadModel::from_pref(&self.source.get_string(DRIVER_CONTROLLER, DEFAULT_CONTROLLER))
    }

    pub fn operator_controller(&self) -> GamepadModel {
        GamepadModel::from_pref(&self.source.get_string(OPERATOR_CONTROLLER, DEFAULT_CONTROLLER))
    }

    pub fn run_sensors_thread(&self) -> bool {
        self.source.get_bool(RUN_SENSORS_THREAD, true)
    }

    pub fn run_thread_timing(&self) -> bool {
        self.source.get_bool(RUN_THREAD_TIMING, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::prefs::{MapPreferences, PrefValue};

    #[test]
    fn test_defaults() {
        let prefs = Preferences::new(Arc::new(MapPreferences::new()));

        assert!(prefs.use_stu_drive_mode());
        assert!(!prefs.do_flatten_driver_input());
        assert!(!prefs.do_flatten_operator_input());
        assert!(!prefs.run_autonomous());
        assert!(!prefs.use_auto_elevation());
        assert!(!prefs.use_pid_feeder_rotation());
        assert!(prefs.run_sensors_thread());
        assert!(!prefs.run_thread_timing());
        assert_eq!(prefs.driver_controller(), GamepadModel::Xbox360);
        assert_eq!(prefs.operator_controller(), GamepadModel::Xbox360);
    }

    #[test]
    fn test_overrides() {
        let map = MapPreferences::new();
        map.set(USE_STU_DRIVE_MODE, PrefValue::Bool(false));
        map.set(DRIVER_CONTROLLER, PrefValue::String("LogitechF310".into()));
        map.set(OPERATOR_CONTROLLER, PrefValue::String("SteamController".into()));
        let prefs = Preferences::new(Arc::new(map));

        assert!(!prefs.use_stu_drive_mode());
        assert_eq!(prefs.driver_controller(), GamepadModel::LogitechF310);

        // Unknown models fall back to the default
        assert_eq!(prefs.operator_controller(), GamepadModel::Xbox360);
    }
}
