//! # Collection runners
//!
//! The sensor updater and history collector each run an ordered list of collaborators once per
//! tick. Collaborators are called in registration order. The first one to fail is logged and
//! removed, and the rest of that tick is skipped: the remaining collaborators run again on the
//! next tick.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::Result;
use log::{debug, error, info, warn};

use crate::prefs::Preferences;
use crate::sched::{PeriodicTask, TaskControl};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which needs polling to refresh a sensor reading.
pub trait SensorUpdate: Send {
    fn name(&self) -> &str;

    fn update(&mut self) -> Result<()>;
}

/// Something which records a sample of the robot's state.
pub trait HistoryCollect: Send {
    fn name(&self) -> &str;

    fn collect(&mut self) -> Result<()>;
}

/// Common view of a collaborator, so one runner serves both lists.
pub trait Collaborator: Send {
    fn name(&self) -> &str;

    fn run(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// An ordered list of collaborators run with the fail fast policy.
pub struct Collection<C: ?Sized> {
    kind: &'static str,
    items: Vec<Box<C>>,
}

/// Periodic task polling every registered sensor.
pub struct SensorUpdater {
    sensors: Collection<dyn SensorUpdate>,
    prefs: Preferences,
}

/// Periodic task sampling every registered history collector.
pub struct HistoryCollector {
    collectors: Collection<dyn HistoryCollect>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Collaborator for dyn SensorUpdate {
    fn name(&self) -> &str {
        SensorUpdate::name(self)
    }

    fn run(&mut self) -> Result<()> {
        self.update()
    }
}

impl Collaborator for dyn HistoryCollect {
    fn name(&self) -> &str {
        HistoryCollect::name(self)
    }

    fn run(&mut self) -> Result<()> {
        self.collect()
    }
}

impl<C: Collaborator + ?Sized> Collection<C> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, item: Box<C>) {
        debug!("{} {} added", self.kind, item.name());
        self.items.push(item);
    }

    /// Remove the collaborator with the given name, returning whether it was found.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.items.iter().position(|i| i.name() == name) {
            Some(idx) => {
                self.items.remove(idx);
                debug!("{} {} removed", self.kind, name);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name()).collect()
    }

    /// Run every collaborator once, in order.
    ///
    /// On the first failure the collaborator is removed and the pass stops. Returns the number
    /// of collaborators which ran successfully.
    pub fn run_once(&mut self) -> usize {
        let mut ok = 0;

        for idx in 0..self.items.len() {
            if let Err(e) = self.items[idx].run() {
                let failed = self.items.remove(idx);
                error!(
                    "{} {} failed; removing from list: {:#}",
                    self.kind,
                    failed.name(),
                    e
                );
                break;
            }
            ok += 1;
        }

        ok
    }
}

impl SensorUpdater {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            sensors: Collection::new("Sensor"),
            prefs,
        }
    }

    pub fn add(&mut self, sensor: Box<dyn SensorUpdate>) {
        self.sensors.add(sensor)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.sensors.remove(name)
    }

    pub fn sensors(&self) -> &Collection<dyn SensorUpdate> {
        &self.sensors
    }
}

impl PeriodicTask for SensorUpdater {
    fn set_up(&mut self) {
        info!("Sensor updater running {} sensors", self.sensors.len());
    }

    fn do_it(&mut self) -> TaskControl {
        if !self.prefs.run_sensors_thread() {
            warn!("Sensor updates disabled by preferences, stopping sensor updater");
            return TaskControl::Terminate;
        }

        self.sensors.run_once();

        TaskControl::Continue
    }
}

impl HistoryCollector {
    pub fn new() -> Self {
        Self {
            collectors: Collection::new("History collector"),
        }
    }

    pub fn add(&mut self, collector: Box<dyn HistoryCollect>) {
        self.collectors.add(collector)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.collectors.remove(name)
    }

    pub fn collectors(&self) -> &Collection<dyn HistoryCollect> {
        &self.collectors
    }
}

impl Default for HistoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTask for HistoryCollector {
    fn do_it(&mut self) -> TaskControl {
        self.collectors.run_once();

        TaskControl::Continue
    }
}
