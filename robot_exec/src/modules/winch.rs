//! # Winch module
//!
//! Two pairs of motors winding the climbing rope. The right hand pair is mounted mirrored.

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

pub const TM_LEFT_WINCH_MOTORS: &str = "leftWinchMotor(s)";
pub const TM_LEFT_WINCH_SPEED: &str = "leftWinchSpeed";
pub const TM_RIGHT_WINCH_MOTORS: &str = "rightWinchMotor(s)";
pub const TM_RIGHT_WINCH_SPEED: &str = "rightWinchSpeed";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WinchParams {
    pub left_polarity: Polarity,
    pub right_polarity: Polarity,
}

pub struct Winch {
    left: MotorGroup,
    right: MotorGroup,
    params: WinchParams,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for WinchParams {
    fn default() -> Self {
        Self {
            left_polarity: Polarity::Normal,
            right_polarity: Polarity::Inverted,
        }
    }
}

impl Winch {
    /// Build the winch from its left and right motor groups, lead motor first in each.
    pub fn new(
        left: Vec<Arc<dyn Actuator>>,
        right: Vec<Arc<dyn Actuator>>,
        tm: Arc<dyn TelemetrySink>,
        params: WinchParams,
    ) -> Self {
        Self {
            left: MotorGroup::new(left, tm.clone(), TM_LEFT_WINCH_SPEED, TM_LEFT_WINCH_MOTORS),
            right: MotorGroup::new(right, tm, TM_RIGHT_WINCH_SPEED, TM_RIGHT_WINCH_MOTORS),
            params,
        }
    }

    /// Wind the rope in, lifting the robot.
    pub fn wind_in(&self, speed: f64) {
        self.set_speeds(ensure_positive(speed));
    }

    pub fn wind_out(&self, speed: f64) {
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
    fn test_wind() {
        let acts: Vec<Arc<SimActuator>> = (0..4)
            .map(|i| Arc::new(SimActuator::new(format!("winch{}", i), 1.0)))
            .collect();
        let tm = Arc::new(MemTelemetry::new());
        let winch = Winch::new(
            vec![acts[0].clone(), acts[1].clone()],
            vec![acts[2].clone(), acts[3].clone()],
            tm.clone(),
            WinchParams::default(),
        );

        winch.wind_in(-1.0);
        assert_eq!(acts[0].output(), 1.0);
        assert_eq!(acts[1].output(), 1.0);
        assert_eq!(acts[2].output(), -1.0);
        assert_eq!(acts[3].output(), -1.0);
        assert_eq!(tm.number(TM_RIGHT_WINCH_SPEED), Some(-1.0));

        winch.wind_out(0.15);
        assert_eq!(acts[0].output(), -0.15);
        assert_eq!(acts[3].output(), 0.15);

        winch.stop();
        assert!(acts.iter().all(|a| a.output() == 0.0));
        assert_eq!(tm.boolean(TM_LEFT_WINCH_MOTORS), Some(false));
    }
}
