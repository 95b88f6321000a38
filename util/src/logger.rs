//! Logging
//!
//! Log lines go to the console (coloured) and to the session's log file (plain). Each line carries
//! the seconds since the session epoch and the name of the thread that logged it, which for the
//! robot is the name of the periodic task.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::Colorize;
use log::{info, Level, Record};
use std::fmt::Arguments;
use std::thread;
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be Info or more verbose, found {0}")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Cannot open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging for this run. Can only succeed once per process.
///
/// `min_level` can't be quieter than `Info`, task start and stop messages are needed to make sense
/// of a match log.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file).map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            let level = match record.level() {
                Level::Trace => "TRC".dimmed().italic(),
                Level::Debug => "DBG".dimmed(),
                Level::Info => "INF".normal(),
                Level::Warn => "WRN".yellow(),
                Level::Error => "ERR".red().bold(),
            };
            out.finish(format_args!("{} {}", level, line(record, message)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{:5} {}", record.level(), line(record, message)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging to {:?} at {:?}", session.log_file, min_level);
    info!("Session epoch {}", session.epoch());

    Ok(())
}

/// The body of a log line: time, thread, and the module for debug and trace messages.
fn line(record: &Record, message: &Arguments) -> String {
    let time_s = session::get_elapsed_seconds();
    let current = thread::current();
    let task = current.name().unwrap_or("?");

    if record.level() > Level::Info {
        format!("{:10.6} [{}] {}: {}", time_s, task, record.target(), message)
    } else {
        format!("{:10.6} [{}] {}", time_s, task, message)
    }
}
