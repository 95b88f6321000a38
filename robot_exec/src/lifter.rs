//! # Lifter subsystem
//!
//! Climbing: the scissor lift raises the hook onto the bar, the winch then pulls the robot up.
//!
//! The lifter is shared between the driver (pit winching) and the operator (hanging), its
//! modules hold no state so `&self` access is enough.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};

use crate::modules::{scissor_lift::ScissorLift, winch::Winch};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct Lifter {
    winch: Winch,
    scissor: ScissorLift,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Lifter {
    pub fn new(winch: Winch, scissor: ScissorLift) -> Self {
        Self { winch, scissor }
    }

    pub fn reset(&self) {
        debug!("Lifter reset");
        self.stop_lift(false);
        self.stop_hang();
    }

    /// Run the scissor lift up.
    pub fn hang(&self, speed: f64) {
        self.scissor.up(speed);
    }

    pub fn stop_hang(&self) {
        self.scissor.stop();
    }

    /// Wind the winch in at full speed.
    pub fn lift_robot(&self) {
        self.winch.wind_in(1.0);
    }

    pub fn stop_lift(&self, also_scissors: bool) {
        self.winch.stop();

        if also_scissors {
            self.scissor.stop();
        }
    }

    pub fn lower_scissor_lift(&self, speed: f64) {
        self.scissor.down(speed);
    }

    /// Manual winch control used in the pit. Winding out takes priority over winding in, both
    /// released stops the winch.
    pub fn pit_winch(&self, wind_in: f64, wind_out: f64) {
        if wind_out > 0.0 {
            trace!("Pit winch out {:.2}", wind_out);
            self.winch.wind_out(wind_out);
        } else if wind_in > 0.0 {
            trace!("Pit winch in {:.2}", wind_in);
            self.winch.wind_in(wind_in);
        } else {
            self.winch.stop();
        }
    }
}
