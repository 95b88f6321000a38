//! # Sensors
//!
//! Encoder readings polled by the sensor updater and published for the dashboard.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;

use hw_if::{actuator::Actuator, telemetry::TelemetrySink};

use crate::collect::SensorUpdate;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_ELEVATION_POSITION: &str = "elevationPosition";
pub const TM_FEEDER_POSITION: &str = "feederPosition";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// An encoder attached to an actuator, published under a telemetry key.
///
/// Readings further than `limit` counts from zero are treated as a broken sensor.
pub struct EncoderSensor {
    name: &'static str,
    tm_key: &'static str,
    actuator: Arc<dyn Actuator>,
    tm: Arc<dyn TelemetrySink>,
    limit: i64,
    last: Option<i64>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl EncoderSensor {
    /// Shooter elevation encoder.
    pub fn elevation(actuator: Arc<dyn Actuator>, tm: Arc<dyn TelemetrySink>, limit: i64) -> Self {
        Self::new("ElevationSensor", TM_ELEVATION_POSITION, actuator, tm, limit)
    }

    /// Feeder rotation encoder.
    pub fn feeder(actuator: Arc<dyn Actuator>, tm: Arc<dyn TelemetrySink>, limit: i64) -> Self {
        Self::new("FeederSensor", TM_FEEDER_POSITION, actuator, tm, limit)
    }

    fn new(
        name: &'static str,
        tm_key: &'static str,
        actuator: Arc<dyn Actuator>,
        tm: Arc<dyn TelemetrySink>,
        limit: i64,
    ) -> Self {
        Self {
            name,
            tm_key,
            actuator,
            tm,
            limit,
            last: None,
        }
    }

    /// The last reading taken, in encoder counts.
    pub fn last(&self) -> Option<i64> {
        self.last
    }
}

impl SensorUpdate for EncoderSensor {
    fn name(&self) -> &str {
        self.name
    }

    fn update(&mut self) -> Result<()> {
        let counts = self.actuator.position();

        if counts.abs() > self.limit {
            return Err(eyre!(
                "{} reading {} counts from {} is beyond the {} count limit",
                self.name,
                counts,
                self.actuator.name(),
                self.limit
            ));
        }

        self.last = Some(counts);
        self.tm.put_number(self.tm_key, counts as f64);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::{MemTelemetry, SimActuator};

    #[test]
    fn test_publish_and_limit() {
        let act = Arc::new(SimActuator::new("elevation", 4096.0));
        let tm = Arc::new(MemTelemetry::new());
        let mut sensor = EncoderSensor::elevation(act.clone(), tm.clone(), 10_000);

        act.set_position(-1234);
        sensor.update().unwrap();
        assert_eq!(sensor.last(), Some(-1234));
        assert_eq!(tm.number(TM_ELEVATION_POSITION), Some(-1234.0));

        act.set_position(20_000);
        assert!(sensor.update().is_err());
        assert_eq!(sensor.last(), Some(-1234));
        assert_eq!(SensorUpdate::name(&sensor), "ElevationSensor");
    }
}
