//! # Input shaping
//!
//! Response curves applied to raw stick values. Both curves clamp their input to `[-1, 1]`,
//! preserve sign, and map `0 -> 0` and `±1 -> ±1` exactly.

use std::f64::consts::E;

use util::maths::clamp_unit;

/// Default deadband, stick values smaller than this are noise.
pub const DEFAULT_DEADBAND: f64 = 0.05;

/// Whether an input is inside the deadband.
pub fn is_zero(value: f64, deadband: f64) -> bool {
    value.abs() < deadband
}

/// Replace values inside the deadband with exactly zero.
pub fn deadband(value: f64, deadband: f64) -> f64 {
    if is_zero(value, deadband) {
        0.0
    } else {
        value
    }
}

/// Exponential flattening, `sign(x) * (e^|x| - 1) / (e - 1)`.
pub fn exponentiate(value: f64) -> f64 {
    let x = clamp_unit(value);
    let mag = x.abs().exp_m1() / (E - 1.0);

    mag.copysign(x)
}

/// Square law, `sign(x) * x^2`.
pub fn square(value: f64) -> f64 {
    let x = clamp_unit(value);

    x * x.abs()
}

/// Full flattening of a drive input: exponentiate, then square.
pub fn flatten(value: f64) -> f64 {
    square(exponentiate(value))
}
