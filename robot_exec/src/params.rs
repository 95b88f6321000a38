//! # Robot executable parameters
//!
//! Parameters for the executable itself and the groupings used to load each subsystem's
//! parameter file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::drive_train::DriveTrainParams;
use crate::match_time::MatchParams;
use crate::modes::AutonomousParams;
use crate::modules::{
    elevation::ElevationParams, feeder::FeederParams, scissor_lift::ScissorLiftParams,
    shooter_wheels::ShooterWheelsParams, winch::WinchParams,
};
use crate::ophmi::OphmiParams;
use crate::sched::SchedParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Executable parameters, loaded from `robot_exec.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotExecParams {
    /// Period of each task in milliseconds
    pub periods_ms: TaskPeriods,

    pub sched: SchedParams,

    #[serde(rename = "match")]
    pub match_time: MatchParams,

    /// Number of drive samples kept in memory
    pub history_size: usize,

    /// Archive every drive sample to CSV in the session directory
    pub archive_history: bool,

    /// Readings beyond these limits are treated as a failed sensor
    pub elevation_limit_counts: i64,
    pub feeder_limit_counts: i64,

    /// Distance to the tower reported by the simulated vision system. Negative for no target.
    pub sim_tower_distance_ft: f64,

    pub autonomous: AutonomousParams,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPeriods {
    pub driver: u64,
    pub operator: u64,
    pub sensors: u64,
    pub history: u64,
    pub match_time: u64,
}

/// Shooter parameters, loaded from `shooter.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterParams {
    pub feeder: FeederParams,
    pub elevation: ElevationParams,
    pub wheels: ShooterWheelsParams,
}

/// Drive train and lifter parameters, loaded from `drive.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveParams {
    pub drive_train: DriveTrainParams,
    pub winch: WinchParams,
    pub scissor: ScissorLiftParams,
}

/// Every parameter set needed to build the robot.
#[derive(Debug, Clone, Default)]
pub struct RobotParams {
    pub exec: RobotExecParams,
    pub shooter: ShooterParams,
    pub drive: DriveParams,
    pub ophmi: OphmiParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for RobotExecParams {
    fn default() -> Self {
        Self {
            periods_ms: TaskPeriods::default(),
            sched: SchedParams::default(),
            match_time: MatchParams::default(),
            history_size: 100,
            archive_history: false,
            elevation_limit_counts: 100_000,
            feeder_limit_counts: 1_000_000_000,
            sim_tower_distance_ft: 15.0,
            autonomous: AutonomousParams::default(),
        }
    }
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            driver: 10,
            operator: 10,
            sensors: 200,
            history: 200,
            match_time: 1000,
        }
    }
}

impl TaskPeriods {
    pub fn driver(&self) -> Duration {
        Duration::from_millis(self.driver)
    }

    pub fn operator(&self) -> Duration {
        Duration::from_millis(self.operator)
    }

    pub fn sensors(&self) -> Duration {
        Duration::from_millis(self.sensors)
    }

    pub fn history(&self) -> Duration {
        Duration::from_millis(self.history)
    }

    pub fn match_time(&self) -> Duration {
        Duration::from_millis(self.match_time)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::modules::Polarity;

    #[test]
    fn test_parse_partial() {
        let exec: RobotExecParams = util::params::parse(
            r#"
            history_size = 50

            [periods_ms]
            driver = 20

            [match]
            match_s = 140.0

            [autonomous]
            start_delay_s = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(exec.history_size, 50);
        assert_eq!(exec.periods_ms.driver(), Duration::from_millis(20));
        assert_eq!(exec.periods_ms.operator(), Duration::from_millis(10));
        assert_eq!(exec.match_time.match_s, 140.0);
        assert_eq!(exec.match_time.autonomous_s, 15.0);
        assert_eq!(exec.autonomous.start_delay_s, 1.0);
        assert_eq!(exec.autonomous.drive_s, 2.2);
    }

    #[test]
    fn test_shipped_params() {
        let exec: RobotExecParams =
            util::params::parse(include_str!("../../params/robot_exec.toml")).unwrap();
        assert_eq!(exec.periods_ms.match_time(), Duration::from_secs(1));

        let shooter: ShooterParams =
            util::params::parse(include_str!("../../params/shooter.toml")).unwrap();
        assert_eq!(shooter.elevation.distance_coeffs.len(), 4);
        assert_eq!(shooter.feeder.automatic.gains.k_p, 0.1);

        let drive: DriveParams =
            util::params::parse(include_str!("../../params/drive.toml")).unwrap();
        assert_eq!(drive.drive_train.right_polarity, Polarity::Inverted);

        let ophmi: OphmiParams =
            util::params::parse(include_str!("../../params/ophmi.toml")).unwrap();
        assert_eq!(ophmi.layouts, crate::ophmi::gamepad::GamepadLayouts::default());
        assert_eq!(ophmi.operator.home_settle_s, 2.0);

        let net: hw_if::net::NetParams =
            util::params::parse(include_str!("../../params/net.toml")).unwrap();
        assert!(!net.publish_tm);

        let prefs: hw_if::prefs::MapPreferences =
            util::params::parse(include_str!("../../params/prefs.toml")).unwrap();
        let prefs = crate::prefs::Preferences::new(std::sync::Arc::new(prefs));
        assert!(prefs.use_stu_drive_mode());
        assert!(prefs.run_autonomous());
    }

    #[test]
    fn test_parse_shooter() {
        let shooter: ShooterParams = util::params::parse(
            r#"
            [elevation]
            distance_coeffs = [1.0, 2.0, 3.0, 4.0]
            polarity = "Normal"

            [feeder.automatic]
            peak_output = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(shooter.elevation.distance_coeffs, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shooter.elevation.polarity, Polarity::Normal);
        assert_eq!(shooter.feeder.automatic.peak_output, 0.25);
        assert_eq!(shooter.feeder.motor_revs_per_flap_rev, 163.6);
    }
}
