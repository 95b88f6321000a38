//! Run sessions
//!
//! Every run of the robot executable gets its own directory, `<dir>/<exec>_<timestamp>`, holding
//! the log file and an `arch` directory for CSV archives. The time the first session was opened is
//! the epoch used to timestamp log lines and archived samples.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use conquer_once::{OnceCell, TryInitError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{host, time};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Directory timestamp, sorts chronologically.
const DIR_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

const ARCHIVE_DIR: &str = "arch";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    /// The directory of this run
    pub root: PathBuf,

    /// Where CSV archives are written
    pub archive_dir: PathBuf,

    pub log_file: PathBuf,

    epoch: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable ({}) is not set", host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("Another thread is setting the session epoch")]
    EpochBusy,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Session {
    /// Open a session in `sessions_dir` under the software root.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, root.join(sessions_dir))
    }

    /// Open a session in an explicit directory.
    ///
    /// Sessions opened later in the same process share the first session's epoch.
    pub fn new_in<P: AsRef<Path>>(exec_name: &str, sessions_dir: P) -> Result<Self, SessionError> {
        let epoch = match EPOCH.try_init_once(Utc::now) {
            Ok(()) | Err(TryInitError::AlreadyInit) => EPOCH.get().copied(),
            Err(TryInitError::WouldBlock) => None,
        }
        .ok_or(SessionError::EpochBusy)?;

        let root = sessions_dir
            .as_ref()
            .join(format!("{}_{}", exec_name, epoch.format(DIR_TIMESTAMP)));
        let archive_dir = root.join(ARCHIVE_DIR);

        fs::create_dir_all(&archive_dir)
            .map_err(|e| SessionError::CannotCreateDir(archive_dir.clone(), e))?;

        Ok(Session {
            log_file: root.join(format!("{}.log", exec_name)),
            root,
            archive_dir,
            epoch,
        })
    }

    pub fn epoch(&self) -> &DateTime<Utc> {
        &self.epoch
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds since the session epoch, `NAN` before any session has been opened (as in unit tests).
pub fn get_elapsed_seconds() -> f64 {
    EPOCH
        .get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(std::f64::NAN)
}
