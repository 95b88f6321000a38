//! # Drive history
//!
//! Samples the drive train output each tick into a bounded in-memory log, and optionally
//! archives every sample to CSV in the session directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use util::{archive::Archiver, session};

use crate::collect::HistoryCollect;
use crate::drive_train::{lock_drive, SharedDriveTrain};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// One sample of the drive output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriveSample {
    /// Seconds since the start of the session.
    pub time_s: f64,
    pub left: f64,
    pub right: f64,
    pub override_active: bool,
}

/// Shared, bounded log of drive samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleLog {
    samples: Arc<Mutex<VecDeque<DriveSample>>>,
    capacity: usize,
}

pub struct DriveHistory {
    drive: SharedDriveTrain,
    log: SampleLog,
    archiver: Option<Archiver>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl SampleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest when full.
    pub fn push(&self, sample: DriveSample) -> Result<()> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| eyre!("Drive history log lock poisoned"))?;

        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<DriveSample> {
        self.samples.lock().ok().and_then(|s| s.back().copied())
    }

    pub fn to_vec(&self) -> Vec<DriveSample> {
        self.samples
            .lock()
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl DriveHistory {
    pub fn new(drive: SharedDriveTrain, capacity: usize, archiver: Option<Archiver>) -> Self {
        Self {
            drive,
            log: SampleLog::new(capacity),
            archiver,
        }
    }

    /// Handle on the sample log, for reading while the collector runs.
    pub fn log(&self) -> SampleLog {
        self.log.clone()
    }
}

impl HistoryCollect for DriveHistory {
    fn name(&self) -> &str {
        "DriveHistory"
    }

    fn collect(&mut self) -> Result<()> {
        let output = lock_drive(&self.drive).output();

        let sample = DriveSample {
            time_s: session::get_elapsed_seconds(),
            left: output.left,
            right: output.right,
            override_active: output.override_active,
        };

        self.log.push(sample)?;

        if let Some(ref mut arch) = self.archiver {
            arch.serialise(sample)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_train::{ArcadeMix, DriveTrain, DriveTrainParams};
    use hw_if::sim::{MemTelemetry, SimActuator};

    fn drive() -> SharedDriveTrain {
        let l = Arc::new(SimActuator::new("l", 1.0));
        let r = Arc::new(SimActuator::new("r", 1.0));
        Arc::new(Mutex::new(DriveTrain::new(
            vec![l],
            vec![r],
            Arc::new(MemTelemetry::new()),
            DriveTrainParams::default(),
        )))
    }

    #[test]
    fn test_bounded_log() {
        let drive = drive();
        let mut history = DriveHistory::new(drive.clone(), 3, None);
        let log = history.log();
        assert!(log.is_empty());

        for i in 0..5 {
            drive
                .lock()
                .unwrap()
                .arcade_drive(i as f64 * 0.1, 0.0, ArcadeMix::Custom);
            history.collect().unwrap();
        }

        assert_eq!(log.len(), 3);
        let samples = log.to_vec();
        assert!((samples[0].left - 0.2).abs() < 1e-12);
        assert!((log.latest().unwrap().right - 0.4).abs() < 1e-12);
        assert!(!samples[2].override_active);
    }

    #[test]
    fn test_archive() {
        let path = std::env::temp_dir().join(format!("drive_history_{}.csv", std::process::id()));
        let drive = drive();
        let arch = Archiver::from_file(&path).unwrap();
        let mut history = DriveHistory::new(drive.clone(), 10, Some(arch));

        drive.lock().unwrap().drive_straight(-0.5);
        history.collect().unwrap();
        history.collect().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("time_s,left,right,override_active"));
        assert_eq!(lines.count(), 2);

        std::fs::remove_file(&path).ok();
    }
}
