//! # Shooter wheels module

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

pub const TM_LEFT_MOTOR: &str = "leftShooterMotor";
pub const TM_LEFT_SPEED: &str = "leftShooterSpeed";
pub const TM_RIGHT_MOTOR: &str = "rightShooterMotor";
pub const TM_RIGHT_SPEED: &str = "rightShooterSpeed";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterWheelsParams {
    pub left_polarity: Polarity,
    pub right_polarity: Polarity,
}

/// The pair of flywheels which launch the ball.
pub struct ShooterWheels {
    left: MotorGroup,
    right: MotorGroup,
    params: ShooterWheelsParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for ShooterWheelsParams {
    fn default() -> Self {
        Self {
            left_polarity: Polarity::Inverted,
            right_polarity: Polarity::Inverted,
        }
    }
}

impl ShooterWheels {
    pub fn new(
        left: Arc<dyn Actuator>,
        right: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        params: ShooterWheelsParams,
    ) -> Self {
        Self {
            left: MotorGroup::single(left, tm.clone(), TM_LEFT_SPEED, TM_LEFT_MOTOR),
            right: MotorGroup::single(right, tm, TM_RIGHT_SPEED, TM_RIGHT_MOTOR),
            params,
        }
    }

    /// Spin the wheels outwards to shoot. The sign of `speed` is ignored.
    pub fn shoot(&self, speed: f64) {
        self.set_speeds(ensure_positive(speed));
    }

    /// Spin the wheels inwards to eject a jammed ball. The sign of `speed` is ignored.
    pub fn eject(&self, speed: f64) {
        self.set_speeds(ensure_negative(speed));
    }

    pub fn stop(&self) {
        self.set_speeds(0.0);
    }

    fn set_speeds(&self, speed: f64) {
        self.left.set_speed(self.params.left_polarity.apply(speed));
        self.right.set_speed(self.params.right_polarity.apply(speed));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::{MemTelemetry, SimActuator};

    #[test]
    fn test_shoot_and_eject() {
        let left = Arc::new(SimActuator::new("left", 1.0));
        let right = Arc::new(SimActuator::new("right", 1.0));
        let tm = Arc::new(MemTelemetry::new());
        let wheels = ShooterWheels::new(
            left.clone(),
            right.clone(),
            tm.clone(),
            ShooterWheelsParams::default(),
        );

        wheels.shoot(-0.7);
        assert_eq!(left.output(), -0.7);
        assert_eq!(right.output(), -0.7);
        assert_eq!(tm.number(TM_LEFT_SPEED), Some(-0.7));
        assert_eq!(tm.boolean(TM_RIGHT_MOTOR), Some(true));

        wheels.eject(0.5);
        assert_eq!(left.output(), 0.5);
        assert_eq!(right.output(), 0.5);

        wheels.stop();
        assert_eq!(left.output(), 0.0);
        assert_eq!(tm.boolean(TM_LEFT_MOTOR), Some(false));
    }
}
