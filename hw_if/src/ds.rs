//! # Driver station interface

use serde::{Deserialize, Serialize};

/// The mode the field management system has put the robot in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotMode {
    Disabled,
    Autonomous,
    Teleoperated,
    Test,
}

/// Driver station state.
pub trait DriverStation: Send + Sync {
    /// Whether the robot outputs are enabled.
    fn is_enabled(&self) -> bool;

    fn mode(&self) -> RobotMode;

    /// Seconds elapsed in the current match period.
    fn match_time_s(&self) -> f64;
}
