//! # Robot library.
//!
//! The control core of the 2016 robot. Gamepad inputs and sensors are turned into motor commands
//! by a set of periodic tasks, each run in its own thread by the scheduler.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Chassis state, the latest vision target
pub mod chassis;

/// Fail-fast collections of sensors and history collectors, and the tasks which run them
pub mod collect;

/// Drive train kinematics and the straight line override
pub mod drive_train;

/// Bounded history of the drive output
pub mod history;

/// Hanging subsystem, the winch and scissor lift
pub mod lifter;

/// Match time display
pub mod match_time;

/// Autonomous and teleoperated modes
pub mod modes;

/// Mechanism modules (feeder, elevation, shooter wheels, winch, scissor lift)
pub mod modules;

/// Operator HMI, the driver and operator gamepad processing
pub mod ophmi;

/// Parameter sets for the executable and each subsystem
pub mod params;

/// Typed runtime preferences
pub mod prefs;

/// Composition root
pub mod robot;

/// Drift-compensated periodic task scheduler and the named task registry
pub mod sched;

/// Encoder sensors
pub mod sensors;

/// Shooter subsystem, the feeder, elevation and shooter wheels
pub mod shooter;
