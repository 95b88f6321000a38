//! # Hardware interface crate.
//!
//! Provides the interfaces the robot software uses to reach the outside world: motor
//! controllers, gamepads, the driver station, telemetry and preferences. The robot core only
//! ever talks to these traits, concrete hardware is plugged in by the executable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Motor controller interface
pub mod actuator;

/// Driver station state (match mode, match time)
pub mod ds;

/// Gamepad/joystick interface
pub mod input;

/// Runtime preferences interface
pub mod prefs;

/// Simulated hardware, used when running off-robot and in tests
pub mod sim;

/// Telemetry sink interface
pub mod telemetry;

/// Network telemetry publisher
pub mod net;
