//! # Robot
//!
//! The composition root. [`Robot`] builds every module, subsystem and gamepad processor once
//! from the hardware handles and parameters, then runs the background tasks and each match mode.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, warn};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use hw_if::{
    actuator::Actuator,
    ds::DriverStation,
    input::InputSource,
    sim::{SimActuator, SimDriverStation, SimInput},
    telemetry::TelemetrySink,
};
use util::{
    archive::{ArchiveError, Archiver},
    session::Session,
};

use crate::chassis::Chassis;
use crate::collect::{HistoryCollector, SensorUpdater};
use crate::drive_train::{lock_drive, DriveTrain, SharedDriveTrain};
use crate::history::{DriveHistory, SampleLog};
use crate::lifter::Lifter;
use crate::match_time::MatchTimeUpdater;
use crate::modes::{self, ModeOutcome, ModeSignal};
use crate::modules::{
    elevation::ElevationModule, feeder::FeederModule, scissor_lift::ScissorLift,
    shooter_wheels::ShooterWheels, winch::Winch,
};
use crate::ophmi::{driver::DriverPad, gamepad::Gamepad, operator::OperatorPad};
use crate::params::{RobotParams, ShooterParams};
use crate::prefs::Preferences;
use crate::sched::{
    registry::{RegistryError, TaskRegistry},
    SchedError, Scheduler,
};
use crate::sensors::EncoderSensor;
use crate::shooter::Shooter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_MODE: &str = "MODE";

pub const SENSOR_UPDATER: &str = "SensorUpdater";
pub const HISTORY_COLLECTOR: &str = "HistoryCollector";
pub const MATCH_TIME_UPDATER: &str = "MatchTimeUpdater";

const DRIVE_HISTORY_ARCHIVE: &str = "drive_history.csv";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Handles on every piece of hardware the robot uses.
pub struct RobotHardware {
    pub left_drive: Vec<Arc<dyn Actuator>>,
    pub right_drive: Vec<Arc<dyn Actuator>>,

    pub feeder: Arc<dyn Actuator>,
    pub elevation: Arc<dyn Actuator>,
    pub left_shooter: Arc<dyn Actuator>,
    pub right_shooter: Arc<dyn Actuator>,

    pub left_winch: Vec<Arc<dyn Actuator>>,
    pub right_winch: Vec<Arc<dyn Actuator>>,
    pub scissor: Arc<dyn Actuator>,

    pub driver_input: Arc<dyn InputSource>,
    pub operator_input: Arc<dyn InputSource>,

    pub ds: Arc<dyn DriverStation>,
}

pub struct Robot {
    params: RobotParams,
    prefs: Preferences,
    tm: Arc<dyn TelemetrySink>,
    ds: Arc<dyn DriverStation>,

    chassis: Arc<Chassis>,
    drive: SharedDriveTrain,
    lifter: Arc<Lifter>,

    elevation_actuator: Arc<dyn Actuator>,
    feeder_actuator: Arc<dyn Actuator>,

    /// The gamepad processors, away while teleop is running.
    driver: Option<DriverPad>,
    operator: Option<OperatorPad>,

    registry: TaskRegistry,
    history: Option<SampleLog>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("Background task error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Gamepad task error: {0}")]
    SchedError(#[from] SchedError),

    #[error("Cannot archive the drive history: {0}")]
    ArchiveError(#[from] ArchiveError),

    #[error("The gamepad processors were lost when a previous teleop failed")]
    PadsUnavailable,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl RobotHardware {
    /// Simulated hardware, for running off the robot.
    pub fn simulated(ds: Arc<SimDriverStation>, shooter: &ShooterParams) -> Self {
        let sim = |name: &str| -> Arc<dyn Actuator> { Arc::new(SimActuator::new(name, 1.0)) };

        Self {
            left_drive: vec![sim("leftFrontDrive"), sim("leftRearDrive")],
            right_drive: vec![sim("rightFrontDrive"), sim("rightRearDrive")],
            feeder: Arc::new(SimActuator::new(
                "feeder",
                shooter.feeder.counts_per_motor_rev,
            )),
            elevation: Arc::new(SimActuator::new(
                "elevation",
                shooter.elevation.clicks_per_rev,
            )),
            left_shooter: sim("leftShooter"),
            right_shooter: sim("rightShooter"),
            left_winch: vec![sim("leftWinch")],
            right_winch: vec![sim("rightWinch")],
            scissor: sim("scissorLift"),
            driver_input: Arc::new(SimInput::new()),
            operator_input: Arc::new(SimInput::new()),
            ds,
        }
    }
}

impl Robot {
    pub fn new(
        hw: RobotHardware,
        params: RobotParams,
        prefs: Preferences,
        tm: Arc<dyn TelemetrySink>,
    ) -> Self {
        let shooter = Shooter::new(
            FeederModule::new(
                hw.feeder.clone(),
                tm.clone(),
                params.shooter.feeder.clone(),
                prefs.use_pid_feeder_rotation(),
            ),
            ElevationModule::new(
                hw.elevation.clone(),
                tm.clone(),
                params.shooter.elevation.clone(),
                prefs.use_auto_elevation(),
            ),
            ShooterWheels::new(
                hw.left_shooter,
                hw.right_shooter,
                tm.clone(),
                params.shooter.wheels.clone(),
            ),
        );

        let lifter = Arc::new(Lifter::new(
            Winch::new(
                hw.left_winch,
                hw.right_winch,
                tm.clone(),
                params.drive.winch.clone(),
            ),
            ScissorLift::new(hw.scissor, tm.clone(), params.drive.scissor.clone()),
        ));

        let drive = Arc::new(Mutex::new(DriveTrain::new(
            hw.left_drive,
            hw.right_drive,
            tm.clone(),
            params.drive.drive_train.clone(),
        )));

        let chassis = Arc::new(Chassis::new(tm.clone()));

        let ophmi = params.ophmi;
        let driver_model = prefs.driver_controller();
        let operator_model = prefs.operator_controller();
        info!(
            "Driver gamepad {:?}, operator gamepad {:?}",
            driver_model, operator_model
        );

        let driver_pad = Gamepad::new(
            hw.driver_input,
            ophmi.layouts.layout(driver_model),
            ophmi.deadband,
        );
        let operator_pad = Gamepad::new(
            hw.operator_input,
            ophmi.layouts.layout(operator_model),
            ophmi.deadband,
        );

        let driver = DriverPad::new(
            driver_pad.clone(),
            drive.clone(),
            lifter.clone(),
            prefs.clone(),
            tm.clone(),
            ophmi.driver,
        );

        let operator = OperatorPad::new(
            operator_pad,
            driver_pad,
            shooter,
            chassis.clone(),
            lifter.clone(),
            drive.clone(),
            prefs.clone(),
            tm.clone(),
            ophmi.operator,
        );

        Self {
            params,
            prefs,
            tm,
            ds: hw.ds,
            chassis,
            drive,
            lifter,
            elevation_actuator: hw.elevation,
            feeder_actuator: hw.feeder,
            driver: Some(driver),
            operator: Some(operator),
            registry: TaskRegistry::new(),
            history: None,
        }
    }

    pub fn chassis(&self) -> &Arc<Chassis> {
        &self.chassis
    }

    pub fn drive(&self) -> &SharedDriveTrain {
        &self.drive
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// The drive history, once the history collector has been started.
    pub fn history(&self) -> Option<&SampleLog> {
        self.history.as_ref()
    }

    /// Start the sensor updater, history collector and match time updater.
    ///
    /// The drive history is archived into the session when one is given and archiving is
    /// enabled.
    pub fn start_background(&mut self, session: Option<&Session>) -> Result<(), RobotError> {
        let exec = &self.params.exec;
        let mut sched = exec.sched;
        sched.log_timing |= self.prefs.run_thread_timing();

        let mut sensors = SensorUpdater::new(self.prefs.clone());
        sensors.add(Box::new(EncoderSensor::elevation(
            self.elevation_actuator.clone(),
            self.tm.clone(),
            exec.elevation_limit_counts,
        )));
        sensors.add(Box::new(EncoderSensor::feeder(
            self.feeder_actuator.clone(),
            self.tm.clone(),
            exec.feeder_limit_counts,
        )));

        let archiver = match session {
            Some(s) if exec.archive_history => Some(Archiver::from_path(s, DRIVE_HISTORY_ARCHIVE)?),
            _ => None,
        };
        let drive_history = DriveHistory::new(self.drive.clone(), exec.history_size, archiver);
        let log = drive_history.log();

        let mut history = HistoryCollector::new();
        history.add(Box::new(drive_history));

        let match_time = MatchTimeUpdater::new(self.ds.clone(), self.tm.clone(), exec.match_time);

        self.registry.start(
            Scheduler::new(SENSOR_UPDATER, exec.periods_ms.sensors(), sched),
            sensors,
        )?;
        self.registry.start(
            Scheduler::new(HISTORY_COLLECTOR, exec.periods_ms.history(), sched),
            history,
        )?;
        self.registry.start(
            Scheduler::new(MATCH_TIME_UPDATER, exec.periods_ms.match_time(), sched),
            match_time,
        )?;

        self.history = Some(log);
        info!("Background tasks started: {:?}", self.registry.names());

        Ok(())
    }

    /// Run teleop until the mode ends.
    pub fn teleop(&mut self, signal: &mut ModeSignal) -> Result<(), RobotError> {
        let driver = self.driver.take().ok_or(RobotError::PadsUnavailable)?;
        let operator = match self.operator.take() {
            Some(o) => o,
            None => {
                self.driver = Some(driver);
                return Err(RobotError::PadsUnavailable);
            }
        };

        self.tm.put_string(TM_MODE, "Teleoperated");

        let periods = self.params.exec.periods_ms;
        let (driver, operator) = modes::run_teleop(
            driver,
            operator,
            periods.driver(),
            periods.operator(),
            self.params.exec.sched,
            signal,
        )?;

        self.driver = Some(driver);
        self.operator = Some(operator);
        self.tm.put_string(TM_MODE, "Running");

        Ok(())
    }

    /// Run autonomous, if enabled, then hold until the mode ends.
    pub fn autonomous(&mut self, signal: &mut ModeSignal) -> Result<(), RobotError> {
        self.tm.put_string(TM_MODE, "Autonomous");

        if self.prefs.run_autonomous() {
            let operator = self.operator.as_mut().ok_or(RobotError::PadsUnavailable)?;

            let outcome = modes::run_autonomous(
                operator.shooter_mut(),
                &self.drive,
                &self.params.exec.autonomous,
                signal,
            );

            if outcome == ModeOutcome::Interrupted {
                warn!("Autonomous routine cut short by the end of the mode");
            }
        } else {
            info!("Autonomous disabled by preferences");
        }

        signal.wait_for_end();
        self.tm.put_string(TM_MODE, "Running");

        Ok(())
    }

    /// Stop every background task and leave every mechanism stopped.
    pub fn shutdown(&mut self) -> Result<(), RobotError> {
        info!("Robot shutting down");

        let result = self.registry.quit_all();

        if let Some(ref mut operator) = self.operator {
            operator.shooter_mut().reset();
        }
        self.lifter.reset();
        lock_drive(&self.drive).stop_driving_straight();

        result.map_err(RobotError::from)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chassis::VisionUpdate;
    use crate::match_time::TM_MATCH_TIME;
    use crate::modes::mode_signal;
    use hw_if::{
        ds::RobotMode,
        prefs::{MapPreferences, PrefValue},
        sim::MemTelemetry,
    };
    use std::thread;
    use std::time::Duration;

    struct Rig {
        robot: Robot,
        ds: Arc<SimDriverStation>,
        driver_input: Arc<SimInput>,
        tm: Arc<MemTelemetry>,
    }

    fn rig(prefs: &[(&str, bool)]) -> Rig {
        let ds = Arc::new(SimDriverStation::new());
        let tm = Arc::new(MemTelemetry::new());

        let mut params = RobotParams::default();
        params.exec.periods_ms.driver = 5;
        params.exec.periods_ms.operator = 5;
        params.exec.periods_ms.sensors = 5;
        params.exec.periods_ms.history = 5;
        params.exec.periods_ms.match_time = 5;
        params.exec.autonomous.start_delay_s = 0.0;
        params.exec.autonomous.feed_s = 0.01;
        params.exec.autonomous.drive_s = 0.01;

        let mut hw = RobotHardware::simulated(ds.clone(), &params.shooter);
        let driver_input = Arc::new(SimInput::new());
        hw.driver_input = driver_input.clone();

        let map = MapPreferences::new();
        for (k, v) in prefs {
            map.set(*k, PrefValue::Bool(*v));
        }

        let robot = Robot::new(hw, params, Preferences::new(Arc::new(map)), tm.clone());

        Rig {
            robot,
            ds,
            driver_input,
            tm,
        }
    }

    fn end_after(ms: u64) -> (ModeSignal, thread::JoinHandle<()>) {
        let (ender, signal) = mode_signal();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms));
            ender.end();
        });
        (signal, t)
    }

    #[test]
    fn test_background_tasks() {
        let mut rig = rig(&[]);
        rig.robot.chassis().update_vision(VisionUpdate {
            valid: true,
            angle_deg: 0.0,
            distance_ft: 15.0,
        });
        rig.ds.set_mode(RobotMode::Teleoperated, true);
        rig.ds.set_match_time(Some(34.2));

        rig.robot.start_background(None).unwrap();
        assert_eq!(
            rig.robot.registry().names(),
            vec![HISTORY_COLLECTOR, MATCH_TIME_UPDATER, SENSOR_UPDATER]
        );

        // Starting again is refused
        assert!(matches!(
            rig.robot.start_background(None),
            Err(RobotError::RegistryError(RegistryError::AlreadyStarted(_)))
        ));

        thread::sleep(Duration::from_millis(100));

        assert_eq!(rig.tm.string(TM_MATCH_TIME), Some("100".into()));
        assert_eq!(rig.tm.number("elevationPosition"), Some(0.0));
        assert!(!rig.robot.history().unwrap().is_empty());

        rig.robot.shutdown().unwrap();
        assert!(rig.robot.registry().names().is_empty());
        assert_eq!(rig.tm.string(TM_MATCH_TIME), Some(String::new()));
    }

    #[test]
    fn test_teleop() {
        let mut rig = rig(&[]);
        rig.driver_input.set_axis(1, -1.0);

        let (mut signal, t) = end_after(100);
        rig.robot.teleop(&mut signal).unwrap();
        t.join().unwrap();

        assert_eq!(rig.tm.number("hmiSpeed"), Some(-1.0));
        assert_eq!(rig.tm.string("driveMode"), Some("stusArcadeWay".into()));
        assert_eq!(rig.tm.string(TM_MODE), Some("Running".into()));

        // Pads are stopped on the way out
        assert_eq!(lock_drive(rig.robot.drive()).output().left, 0.0);

        // And handed back, so teleop can run again
        let (mut signal, t) = end_after(20);
        rig.robot.teleop(&mut signal).unwrap();
        t.join().unwrap();
    }

    #[test]
    fn test_autonomous() {
        let mut rig = rig(&[("runAutonomous", true)]);

        let (mut signal, t) = end_after(200);
        rig.robot.autonomous(&mut signal).unwrap();
        t.join().unwrap();

        assert_eq!(rig.tm.number("leftDriveSpeed"), Some(0.0));
        assert_eq!(rig.tm.boolean("feederMotor"), Some(false));
        assert_eq!(rig.tm.string(TM_MODE), Some("Running".into()));
    }
}
