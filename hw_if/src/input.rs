//! # Input interface
//!
//! Raw access to a gamepad plugged into the driver station.

/// A raw input device.
pub trait InputSource: Send + Sync {
    /// Axis value in `[-1, 1]`.
    fn axis(&self, index: usize) -> f64;

    /// Whether a button is currently held.
    fn button(&self, index: usize) -> bool;

    /// Directional pad angle in degrees (0 is up, clockwise), or `None` when nothing is
    /// pressed.
    fn pov(&self, index: usize) -> Option<u16>;
}
