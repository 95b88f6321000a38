//! # Actuator interface
//!
//! An actuator is a motor controller with an attached position sensor. It can be driven open
//! loop (a normalised speed demand) or closed loop (a position setpoint in motor revolutions,
//! tracked by the controller's onboard PID).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A motor controller.
///
/// Implementations must be internally thread safe, handles are shared between tasks.
pub trait Actuator: Send + Sync {
    /// Human readable name of the actuator, used in logs.
    fn name(&self) -> &str;

    /// Set the output of the actuator.
    ///
    /// In open loop this is a speed demand in `[-1, 1]`, in closed loop it's the position
    /// setpoint in motor revolutions.
    fn set_output(&self, value: f64);

    /// Switch to open loop (speed) control.
    fn configure_open_loop(&self, config: &OpenLoopConfig);

    /// Switch to closed loop (position) control.
    fn configure_closed_loop(&self, config: &ClosedLoopConfig);

    /// Current position reported by the feedback device, in encoder counts.
    fn position(&self) -> i64;
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// PIDF gains for closed loop control.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub k_f: f64,
}

/// Open loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenLoopConfig {
    /// Maximum output magnitude, as a fraction of bus voltage.
    pub peak_output: f64,
}

/// Closed loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosedLoopConfig {
    pub gains: LoopGains,

    pub feedback: FeedbackSource,

    /// Maximum output magnitude, as a fraction of bus voltage.
    pub peak_output: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The sensor a closed loop is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackSource {
    /// Quadrature encoder, zeroed at power on.
    RelativeEncoder,

    /// Absolute magnetic encoder.
    AbsoluteEncoder,

    /// Analog potentiometer.
    Potentiometer,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for OpenLoopConfig {
    fn default() -> Self {
        Self { peak_output: 1.0 }
    }
}

impl Default for ClosedLoopConfig {
    fn default() -> Self {
        Self {
            gains: LoopGains::default(),
            feedback: FeedbackSource::RelativeEncoder,
            peak_output: 1.0,
        }
    }
}
