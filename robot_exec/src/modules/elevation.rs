//! # Shooter elevation module
//!
//! Sets the shot angle. Manually the operator drives the elevation motor directly. In automatic
//! mode the angle follows the distance to the target: the distance is converted to an encoder
//! position by a fitted cubic, and new distances only move the shooter when they differ from
//! the current setpoint by more than the hysteresis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::{
    actuator::{Actuator, ClosedLoopConfig, FeedbackSource, LoopGains, OpenLoopConfig},
    telemetry::TelemetrySink,
};
use util::maths::poly_val;

use super::{MotorGroup, Polarity, PositionCtrl};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_ELEVATION_MOTOR: &str = "elevationMotor";
pub const TM_ELEVATION_SPEED: &str = "elevationSpeed";
pub const TM_AUTO_ELEVATION: &str = "autoElevation";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationParams {
    /// Coefficients of the distance (ft) to encoder clicks fit, highest order first.
    pub distance_coeffs: Vec<f64>,

    /// Encoder clicks per motor revolution.
    pub clicks_per_rev: f64,

    /// Distances closer than this to the current setpoint don't move the shooter, in feet.
    pub hysteresis_ft: f64,

    /// Closed loop setpoint of the home position, in motor revolutions.
    pub home_revs: f64,

    pub polarity: Polarity,

    pub manual: OpenLoopConfig,

    pub automatic: ClosedLoopConfig,
}

pub struct ElevationModule {
    ctrl: PositionCtrl,
    motor: MotorGroup,
    tm: Arc<dyn TelemetrySink>,
    params: ElevationParams,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Encoder clicks for a shot at the given distance in feet.
///
/// Only meaningful for positive distances, callers must reject the invalid distance sentinel.
pub fn distance_to_encoder(distance_ft: f64, coeffs: &[f64]) -> i64 {
    poly_val(distance_ft, coeffs).round() as i64
}

/// Motor revolutions for an encoder position. Negative revolutions raise the shooter.
pub fn encoder_to_revolutions(clicks: i64, clicks_per_rev: f64) -> f64 {
    -(clicks as f64 / clicks_per_rev)
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for ElevationParams {
    fn default() -> Self {
        Self {
            distance_coeffs: vec![3.845_146_10, 242.179_816, -933.877_07, -4615.472_94],
            clicks_per_rev: 4096.0,
            hysteresis_ft: 0.5,
            home_revs: 0.0,
            polarity: Polarity::Inverted,
            manual: OpenLoopConfig { peak_output: 0.5 },
            automatic: ClosedLoopConfig {
                gains: LoopGains {
                    k_p: 0.15,
                    ..Default::default()
                },
                feedback: FeedbackSource::RelativeEncoder,
                peak_output: 0.5,
            },
        }
    }
}

impl ElevationModule {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        params: ElevationParams,
        auto_allowed: bool,
    ) -> Self {
        let motor = MotorGroup::single(actuator, tm.clone(), TM_ELEVATION_SPEED, TM_ELEVATION_MOTOR);

        let module = Self {
            ctrl: PositionCtrl::new("Elevation", params.hysteresis_ft, auto_allowed),
            motor,
            tm,
            params,
        };

        module.motor.configure_open_loop(&module.params.manual);
        module.tm.put_bool(TM_AUTO_ELEVATION, false);

        module
    }

    pub fn ctrl(&self) -> &PositionCtrl {
        &self.ctrl
    }

    pub fn enable_automatic(&mut self) {
        if !self.ctrl.enable_automatic() {
            return;
        }

        self.motor.set_speed(0.0);
        self.tm.put_bool(TM_AUTO_ELEVATION, true);
        self.motor.set_running(true);
        self.motor.configure_closed_loop(&self.params.automatic);
    }

    pub fn disable_automatic(&mut self) {
        self.ctrl.disable_automatic();
        self.tm.put_bool(TM_AUTO_ELEVATION, false);
        self.motor.set_running(false);
        self.motor.configure_open_loop(&self.params.manual);
    }

    /// Send the shooter to its home position. Automatic mode only.
    ///
    /// Clears the setpoint so the next distance is always applied.
    pub fn set_home(&mut self) {
        if !self.ctrl.is_automatic() {
            trace!("Elevation not automatic, ignoring home");
            return;
        }

        debug!("Elevation homing");
        self.ctrl.clear_setpoint();
        self.motor.set_output(self.params.home_revs);
    }

    /// Aim for a target at the given distance. Automatic mode only.
    pub fn set_for_distance(&mut self, distance_ft: f64) {
        if !self.ctrl.accept_target(distance_ft) {
            return;
        }

        let clicks = distance_to_encoder(distance_ft, &self.params.distance_coeffs);
        let revs = encoder_to_revolutions(clicks, self.params.clicks_per_rev);

        trace!(
            "Elevation for {:.2} ft: {} clicks, {:.3} revs",
            distance_ft,
            clicks,
            revs
        );

        self.motor.set_output(revs);
    }

    /// Manual elevation, positive raises the shooter.
    pub fn adjust(&mut self, speed: f64) {
        if !self.ctrl.allows_manual() {
            return;
        }

        self.motor.set_speed(self.params.polarity.apply(speed));
    }

    /// Hold still without leaving manual mode. Ignored in automatic mode, where zero is a
    /// position.
    pub fn stop_elevation(&mut self) {
        if self.ctrl.allows_manual() {
            self.motor.set_speed(0.0);
        }
    }

    /// Back to manual and stationary.
    pub fn stop(&mut self) {
        self.ctrl.stop();
        self.tm.put_bool(TM_AUTO_ELEVATION, false);
        self.motor.configure_open_loop(&self.params.manual);
        self.motor.set_speed(0.0);
    }
}
