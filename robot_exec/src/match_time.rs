//! # Match time updater
//!
//! Publishes the whole seconds remaining in the current match period for the dashboard.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use hw_if::{
    ds::{DriverStation, RobotMode},
    telemetry::TelemetrySink,
};

use crate::sched::{PeriodicTask, TaskControl};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const TM_MATCH_TIME: &str = "matchTime";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Length of each match period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    pub autonomous_s: f64,
    pub match_s: f64,
}

pub struct MatchTimeUpdater {
    ds: Arc<dyn DriverStation>,
    tm: Arc<dyn TelemetrySink>,
    params: MatchParams,
    shown: Option<String>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            autonomous_s: 15.0,
            match_s: 135.0,
        }
    }
}

impl MatchTimeUpdater {
    pub fn new(ds: Arc<dyn DriverStation>, tm: Arc<dyn TelemetrySink>, params: MatchParams) -> Self {
        Self {
            ds,
            tm,
            params,
            shown: None,
        }
    }

    /// The text to display for the driver station's current state.
    pub fn display(&self) -> String {
        if !self.ds.is_enabled() {
            return String::new();
        }

        let duration = match self.ds.mode() {
            RobotMode::Autonomous => self.params.autonomous_s,
            RobotMode::Teleoperated => self.params.match_s,
            _ => return String::new(),
        };

        let remaining = (duration - self.ds.match_time_s() - 1.0).max(0.0);

        format!("{:.0}", remaining)
    }
}

impl PeriodicTask for MatchTimeUpdater {
    fn set_up(&mut self) {
        self.tm.put_string(TM_MATCH_TIME, "");
        self.shown = Some(String::new());
    }

    fn do_it(&mut self) -> TaskControl {
        let text = self.display();

        if self.shown.as_ref() != Some(&text) {
            self.tm.put_string(TM_MATCH_TIME, &text);
            self.shown = Some(text);
        }

        TaskControl::Continue
    }

    fn clean_up(&mut self) {
        debug!("Match time updater stopped");
        self.tm.put_string(TM_MATCH_TIME, "");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hw_if::sim::{MemTelemetry, SimDriverStation};

    #[test]
    fn test_display() {
        let ds = Arc::new(SimDriverStation::new());
        let tm = Arc::new(MemTelemetry::new());
        let mut updater = MatchTimeUpdater::new(ds.clone(), tm.clone(), MatchParams::default());

        updater.set_up();
        assert_eq!(tm.string(TM_MATCH_TIME), Some(String::new()));

        // Disabled
        ds.set_match_time(Some(3.0));
        updater.do_it();
        assert_eq!(tm.string(TM_MATCH_TIME), Some(String::new()));

        ds.set_mode(RobotMode::Autonomous, true);
        ds.set_match_time(Some(3.2));
        updater.do_it();
        assert_eq!(tm.string(TM_MATCH_TIME), Some("11".into()));

        ds.set_mode(RobotMode::Teleoperated, true);
        ds.set_match_time(Some(100.0));
        updater.do_it();
        assert_eq!(tm.string(TM_MATCH_TIME), Some("34".into()));

        // Floored at zero
        ds.set_match_time(Some(200.0));
        updater.do_it();
        assert_eq!(tm.string(TM_MATCH_TIME), Some("0".into()));

        ds.set_mode(RobotMode::Test, true);
        updater.do_it();
        assert_eq!(tm.string(TM_MATCH_TIME), Some(String::new()));

        ds.set_mode(RobotMode::Teleoperated, false);
        assert_eq!(updater.display(), "");
    }
}
