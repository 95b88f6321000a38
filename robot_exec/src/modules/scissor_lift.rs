//! # Scissor lift module
//!
//! Raises the hook used to latch onto the tower bar.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::{actuator::Actuator, telemetry::TelemetrySink};

use super::{ensure_negative, ensure_positive, MotorGroup, Polarity};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_SCISSOR_MOTOR: &str = "scissorLiftMotor";
pub const TM_SCISSOR_SPEED: &str = "scissorLiftSpeed";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScissorLiftParams {
    pub polarity: Polarity,
}

pub struct ScissorLift {
    motor: MotorGroup,
    params: ScissorLiftParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ScissorLift {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        params: ScissorLiftParams,
    ) -> Self {
        Self {
            motor: MotorGroup::single(actuator, tm, TM_SCISSOR_SPEED, TM_SCISSOR_MOTOR),
            params,
        }
    }

    pub fn up(&self, speed: f64) {
        self.set_speed(ensure_positive(speed));
    }

    pub fn down(&self, speed: f64) {
        self.set_speed(ensure_negative(speed));
    }

    pub fn stop(&self) {
        self.set_speed(0.0);
    }

    fn set_speed(&self, speed: f64) {
        self.motor.set_speed(self.params.polarity.apply(speed));
    }
}
