//! # Robot modes
//!
//! A mode (autonomous, teleoperated) runs until the driver station ends it. The end of a mode is
//! delivered over a channel, so anything waiting inside a mode blocks on the channel rather than
//! polling, and wakes as soon as the mode is over.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use util::time::secs_to_duration;

use crate::drive_train::{lock_drive, ArcadeMix, SharedDriveTrain};
use crate::ophmi::{driver::DriverPad, operator::OperatorPad};
use crate::sched::{SchedError, SchedParams, Scheduler};
use crate::shooter::Shooter;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// The drive forward autonomous routine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomousParams {
    /// Wait for the other robots on the alliance to get clear.
    pub start_delay_s: f64,

    /// Feeder speed used to park the flap before crossing the defence.
    pub feed_speed: f64,
    pub feed_s: f64,

    pub drive_speed: f64,
    pub drive_s: f64,
}

/// Sends the end of mode signal.
#[derive(Debug, Clone)]
pub struct ModeEnder {
    tx: Sender<()>,
}

/// Receives the end of mode signal.
#[derive(Debug)]
pub struct ModeSignal {
    rx: Receiver<()>,
    ended: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// How a mode routine finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOutcome {
    Completed,
    Interrupted,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Create a linked end of mode sender and receiver.
pub fn mode_signal() -> (ModeEnder, ModeSignal) {
    let (tx, rx) = channel();

    (ModeEnder { tx }, ModeSignal { rx, ended: false })
}

/// Run the autonomous routine: wait, park the feeder, drive forward over the defence, stop.
///
/// Every wait returns early if the mode ends, leaving the mechanisms stopped.
pub fn run_autonomous(
    shooter: &mut Shooter,
    drive: &SharedDriveTrain,
    params: &AutonomousParams,
    signal: &mut ModeSignal,
) -> ModeOutcome {
    info!("Autonomous: drive forward");

    if signal.wait(secs_to_duration(params.start_delay_s)) {
        return ModeOutcome::Interrupted;
    }

    debug!("Autonomous: parking feeder");
    shooter.rotate_feeder(params.feed_speed);
    let ended = signal.wait(secs_to_duration(params.feed_s));
    shooter.rotate_feeder(0.0);

    if ended {
        return ModeOutcome::Interrupted;
    }

    debug!("Autonomous: driving");
    lock_drive(drive).arcade_drive(params.drive_speed, 0.0, ArcadeMix::Custom);
    let ended = signal.wait(secs_to_duration(params.drive_s));
    lock_drive(drive).stop();

    if ended {
        ModeOutcome::Interrupted
    } else {
        info!("Autonomous complete");
        ModeOutcome::Completed
    }
}

/// Run the driver and operator pads until the mode ends, then hand them back.
pub fn run_teleop(
    driver: DriverPad,
    operator: OperatorPad,
    driver_period: Duration,
    operator_period: Duration,
    sched: SchedParams,
    signal: &mut ModeSignal,
) -> Result<(DriverPad, OperatorPad), SchedError> {
    info!("Teleop starting");

    let driver_task = Scheduler::new("DriverPad", driver_period, sched).start(driver)?;

    let operator_task = match Scheduler::new("OperatorPad", operator_period, sched).start(operator)
    {
        Ok(t) => t,
        Err(e) => {
            driver_task.quit();
            driver_task.join()?;
            return Err(e);
        }
    };

    signal.wait_for_end();

    driver_task.quit();
    operator_task.quit();

    let driver = driver_task.join()?;
    let operator = operator_task.join()?;

    info!("Teleop stopped");

    Ok((driver, operator))
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for AutonomousParams {
    fn default() -> Self {
        Self {
            start_delay_s: 9.0,
            feed_speed: -0.6,
            feed_s: 0.75,
            drive_speed: 0.85,
            drive_s: 2.2,
        }
    }
}

impl ModeEnder {
    /// End the mode. Ending a mode which has already ended does nothing.
    pub fn end(&self) {
        if self.tx.send(()).is_err() {
            debug!("Mode signal already dropped");
        }
    }
}

impl ModeSignal {
    /// Wait for up to `timeout`, returns true if the mode has ended.
    ///
    /// A dropped sender also ends the mode, so nothing waits forever on a signal that can't
    /// come.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        if self.ended {
            return true;
        }

        match self.rx.recv_timeout(timeout) {
            Ok(()) => self.ended = true,
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Mode signal sender dropped, ending mode");
                self.ended = true;
            }
        }

        self.ended
    }

    /// Block until the mode ends.
    pub fn wait_for_end(&mut self) {
        if self.ended {
            return;
        }

        if self.rx.recv().is_err() {
            warn!("Mode signal sender dropped, ending mode");
        }
        self.ended = true;
    }

    pub fn is_ended(&mut self) -> bool {
        self.wait(Duration::from_secs(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_train::{DriveTrain, DriveTrainParams};
    use crate::modules::{
        elevation::{ElevationModule, ElevationParams},
        feeder::{FeederModule, FeederParams},
        shooter_wheels::{ShooterWheels, ShooterWheelsParams},
    };
    use hw_if::sim::{MemTelemetry, SimActuator};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;

    fn shooter(feeder: Arc<SimActuator>, tm: Arc<MemTelemetry>) -> Shooter {
        Shooter::new(
            FeederModule::new(feeder, tm.clone(), FeederParams::default(), false),
            ElevationModule::new(
                Arc::new(SimActuator::new("elevation", 4096.0)),
                tm.clone(),
                ElevationParams::default(),
                false,
            ),
            ShooterWheels::new(
                Arc::new(SimActuator::new("wl", 1.0)),
                Arc::new(SimActuator::new("wr", 1.0)),
                tm,
                ShooterWheelsParams::default(),
            ),
        )
    }

    fn drive(left: Arc<SimActuator>, tm: Arc<MemTelemetry>) -> SharedDriveTrain {
        Arc::new(Mutex::new(DriveTrain::new(
            vec![left],
            vec![Arc::new(SimActuator::new("r", 1.0))],
            tm,
            DriveTrainParams::default(),
        )))
    }

    #[test]
    fn test_signal() {
        let (ender, mut signal) = mode_signal();
        assert!(!signal.wait(Duration::from_millis(1)));
        assert!(!signal.is_ended());

        ender.end();
        assert!(signal.wait(Duration::from_secs(10)));

        // Stays ended
        assert!(signal.is_ended());
        signal.wait_for_end();
    }

    #[test]
    fn test_signal_dropped_sender() {
        let (ender, mut signal) = mode_signal();
        drop(ender);
        assert!(signal.wait(Duration::from_secs(10)));
    }

    #[test]
    fn test_autonomous_completes() {
        let tm = Arc::new(MemTelemetry::new());
        let feeder = Arc::new(SimActuator::new("feeder", 4096.0));
        let left = Arc::new(SimActuator::new("l", 1.0));
        let mut shooter = shooter(feeder.clone(), tm.clone());
        let drive = drive(left.clone(), tm.clone());

        let params = AutonomousParams {
            start_delay_s: 0.0,
            feed_s: 0.01,
            drive_s: 0.01,
            ..Default::default()
        };

        let (_ender, mut signal) = mode_signal();
        let outcome = run_autonomous(&mut shooter, &drive, &params, &mut signal);

        assert_eq!(outcome, ModeOutcome::Completed);
        assert_eq!(feeder.output(), 0.0);
        assert_eq!(left.output(), 0.0);
        // Drive, then stop
        assert_eq!(left.num_commands(), 2);
        assert_eq!(tm.number("leftDriveSpeed"), Some(0.0));
    }

    #[test]
    fn test_autonomous_interrupted() {
        let tm = Arc::new(MemTelemetry::new());
        let left = Arc::new(SimActuator::new("l", 1.0));
        let mut shooter = shooter(Arc::new(SimActuator::new("feeder", 4096.0)), tm.clone());
        let drive = drive(left.clone(), tm);

        let (ender, mut signal) = mode_signal();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            ender.end();
        });

        let start = Instant::now();
        let outcome = run_autonomous(
            &mut shooter,
            &drive,
            &AutonomousParams::default(),
            &mut signal,
        );
        t.join().unwrap();

        assert_eq!(outcome, ModeOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(left.num_commands(), 0);
    }
}
