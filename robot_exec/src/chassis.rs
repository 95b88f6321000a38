//! # Chassis
//!
//! Holds the latest vision solution for the target tower. The vision processor itself runs
//! off-board, whatever receives its results pushes them in with [`Chassis::update_vision`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use hw_if::telemetry::TelemetrySink;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance reported when there's no valid target.
pub const INVALID_DISTANCE: f64 = -1.0;

pub const TM_DISTANCE_TO_TOWER: &str = "distanceToTower";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// A vision solution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionUpdate {
    pub valid: bool,
    pub angle_deg: f64,
    pub distance_ft: f64,
}

pub struct Chassis {
    vision: RwLock<VisionUpdate>,
    tm: Arc<dyn TelemetrySink>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Chassis {
    pub fn new(tm: Arc<dyn TelemetrySink>) -> Self {
        Self {
            vision: RwLock::new(VisionUpdate::default()),
            tm,
        }
    }

    pub fn update_vision(&self, update: VisionUpdate) {
        trace!("Vision update: {:?}", update);

        if let Ok(mut v) = self.vision.write() {
            *v = update;
        }

        self.tm.put_number(TM_DISTANCE_TO_TOWER, self.distance_to_tower());
    }

    pub fn vision(&self) -> VisionUpdate {
        self.vision.read().map(|v| *v).unwrap_or_default()
    }

    /// Distance to the tower in feet, or [`INVALID_DISTANCE`] without a valid target.
    pub fn distance_to_tower(&self) -> f64 {
        let v = self.vision();

        if v.valid {
            v.distance_ft
        } else {
            INVALID_DISTANCE
        }
    }
}
