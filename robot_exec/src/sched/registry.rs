//! # Named task registry
//!
//! Background tasks (sensor updater, history collector, match time updater) are started through
//! the registry, which gives system wide start/stop access by name. A name can only ever be
//! started once: tasks are never restarted.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, error};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use super::{PeriodicTask, SchedError, Scheduler, TaskHandle};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A type-erased running task.
pub trait RunningTask {
    fn name(&self) -> &str;

    fn quit(&self);

    fn is_running(&self) -> bool;

    fn loop_count(&self) -> u64;

    /// Wait for the task to finish, discarding it.
    fn join(self: Box<Self>) -> Result<(), SchedError>;
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Registry of running tasks, keyed by name.
#[derive(Default)]
pub struct TaskRegistry {
    live: BTreeMap<String, Box<dyn RunningTask>>,
    started: HashSet<String>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("A task named {0} has already been started")]
    AlreadyStarted(String),

    #[error("No running task named {0}")]
    NotRegistered(String),

    #[error(transparent)]
    SchedError(#[from] SchedError),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl<T: PeriodicTask> RunningTask for TaskHandle<T> {
    fn name(&self) -> &str {
        TaskHandle::name(self)
    }

    fn quit(&self) {
        TaskHandle::quit(self)
    }

    fn is_running(&self) -> bool {
        TaskHandle::is_running(self)
    }

    fn loop_count(&self) -> u64 {
        TaskHandle::loop_count(self)
    }

    fn join(self: Box<Self>) -> Result<(), SchedError> {
        TaskHandle::join(*self).map(|_| ())
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task and register it under the scheduler's name.
    ///
    /// Fails if the name has been used before, whether or not that task is still running.
    pub fn start<T: PeriodicTask>(
        &mut self,
        scheduler: Scheduler,
        task: T,
    ) -> Result<(), RegistryError> {
        let name = scheduler.name().to_string();

        if self.started.contains(&name) {
            return Err(RegistryError::AlreadyStarted(name));
        }

        let handle = scheduler.start(task)?;

        self.started.insert(name.clone());
        self.live.insert(name, Box::new(handle));

        Ok(())
    }

    /// Whether a task with this name is registered and still looping.
    pub fn is_running(&self, name: &str) -> bool {
        self.live.get(name).map(|t| t.is_running()).unwrap_or(false)
    }

    /// Number of iterations completed by the named task, if it's registered.
    pub fn loop_count(&self, name: &str) -> Option<u64> {
        self.live.get(name).map(|t| t.loop_count())
    }

    /// Names of all registered tasks.
    pub fn names(&self) -> Vec<&str> {
        self.live.keys().map(|s| s.as_str()).collect()
    }

    /// Stop the named task and wait for it to finish.
    pub fn quit(&mut self, name: &str) -> Result<(), RegistryError> {
        let task = self
            .live
            .remove(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.into()))?;

        task.quit();
        task.join()?;

        debug!("{} removed from the registry", name);

        Ok(())
    }

    /// Stop every task, then wait for them all.
    ///
    /// All tasks are joined even if one fails, the first failure is returned.
    pub fn quit_all(&mut self) -> Result<(), RegistryError> {
        for task in self.live.values() {
            task.quit();
        }

        let mut result = Ok(());

        for (name, task) in std::mem::take(&mut self.live) {
            if let Err(e) = task.join() {
                error!("Task {} did not stop cleanly: {}", name, e);
                if result.is_ok() {
                    result = Err(e.into());
                }
            }
        }

        result
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        if !self.live.is_empty() {
            self.quit_all().ok();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sched::{SchedParams, TaskControl};
    use std::time::Duration;

    struct Idle;

    impl PeriodicTask for Idle {
        fn do_it(&mut self) -> TaskControl {
            TaskControl::Continue
        }
    }

    fn sched(name: &str) -> Scheduler {
        Scheduler::new(name, Duration::from_millis(5), SchedParams::default())
    }

    #[test]
    fn test_names_are_unique() {
        let mut reg = TaskRegistry::new();

        reg.start(sched("sensors"), Idle).unwrap();
        reg.start(sched("history"), Idle).unwrap();
        assert_eq!(reg.names(), vec!["history", "sensors"]);
        assert!(reg.is_running("sensors"));

        match reg.start(sched("sensors"), Idle) {
            Err(RegistryError::AlreadyStarted(n)) => assert_eq!(n, "sensors"),
            _ => panic!("Expected an already started error"),
        }

        reg.quit("sensors").unwrap();
        assert!(!reg.is_running("sensors"));
        assert_eq!(reg.names(), vec!["history"]);

        // Tasks are never restarted
        assert!(matches!(
            reg.start(sched("sensors"), Idle),
            Err(RegistryError::AlreadyStarted(_))
        ));

        reg.quit_all().unwrap();
        assert!(reg.names().is_empty());
    }

    #[test]
    fn test_quit_unknown() {
        let mut reg = TaskRegistry::new();
        assert!(matches!(
            reg.quit("nope"),
            Err(RegistryError::NotRegistered(_))
        ));
    }
}
