//! # Shooter subsystem
//!
//! Groups the feeder, elevation and flywheel modules. The shooter has a single owner, the
//! operator processing task, so every operation takes `&mut self`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use crate::modules::{
    elevation::ElevationModule,
    feeder::{FeederModule, FeederPosition},
    shooter_wheels::ShooterWheels,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct Shooter {
    feeder: FeederModule,
    elevation: ElevationModule,
    wheels: ShooterWheels,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Shooter {
    pub fn new(feeder: FeederModule, elevation: ElevationModule, wheels: ShooterWheels) -> Self {
        Self {
            feeder,
            elevation,
            wheels,
        }
    }

    pub fn feeder(&self) -> &FeederModule {
        &self.feeder
    }

    pub fn elevation(&self) -> &ElevationModule {
        &self.elevation
    }

    /// Stop everything and return each module to manual control.
    pub fn reset(&mut self) {
        info!("Shooter reset");
        self.stop();
    }

    pub fn stop(&mut self) {
        self.feeder.stop();
        self.wheels.stop();
        self.elevation.stop();
    }

    // ---- WHEELS ----

    pub fn shoot(&mut self, speed: f64) {
        self.wheels.shoot(speed);
    }

    pub fn eject(&mut self, speed: f64) {
        self.wheels.eject(speed);
    }

    // ---- FEEDER ----

    pub fn enable_feeder_position(&mut self) {
        self.feeder.enable_automatic();
    }

    pub fn disable_feeder_position(&mut self) {
        self.feeder.disable_automatic();
    }

    pub fn set_feeder_position(&mut self, position: FeederPosition) {
        self.feeder.set_position(position);
    }

    pub fn rotate_feeder(&mut self, speed: f64) {
        self.feeder.adjust(speed);
    }

    // ---- ELEVATION ----

    pub fn enable_auto_elevation(&mut self) {
        self.elevation.enable_automatic();
    }

    pub fn disable_auto_elevation(&mut self) {
        self.elevation.disable_automatic();
    }

    pub fn home_elevation(&mut self) {
        self.elevation.set_home();
    }

    pub fn set_for_distance(&mut self, distance_ft: f64) {
        self.elevation.set_for_distance(distance_ft);
    }

    pub fn adjust_elevation(&mut self, speed: f64) {
        self.elevation.adjust(speed);
    }

    pub fn stop_elevation(&mut self) {
        self.elevation.stop_elevation();
    }
}
