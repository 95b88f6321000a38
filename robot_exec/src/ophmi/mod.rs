//! # Operator HMI
//!
//! Turns the driver's and operator's gamepads into commands for the drive train, shooter and
//! lifter. Each gamepad is processed by its own periodic task.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod driver;
pub mod gamepad;
pub mod operator;
pub mod shaping;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use driver::DriverParams;
use gamepad::GamepadLayouts;
use operator::OperatorParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Operator HMI parameters, loaded from `ophmi.toml`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OphmiParams {
    /// Stick deadband applied to every input.
    pub deadband: f64,

    pub layouts: GamepadLayouts,

    pub driver: DriverParams,

    pub operator: OperatorParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for OphmiParams {
    fn default() -> Self {
        Self {
            deadband: shaping::DEFAULT_DEADBAND,
            layouts: GamepadLayouts::default(),
            driver: DriverParams::default(),
            operator: OperatorParams::default(),
        }
    }
}
