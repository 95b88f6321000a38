//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Apply polynomial coefficients to a value.
///
/// Coefficients are given highest order first, so `[a, b, c]` evaluates
/// `a*x^2 + b*x + c`.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    // Horner's method
    coeffs.iter().fold(T::zero(), |acc, &c| acc * value + c)
}

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Clamp a value into `[-1, 1]`, the range of every normalised speed demand.
pub fn clamp_unit<T>(value: T) -> T
where
    T: Float,
{
    clamp(value, -T::one(), T::one())
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Scale a pair of values down so that neither has a magnitude above 1,
/// keeping their ratio.
pub fn desaturate<T>(a: T, b: T) -> (T, T)
where
    T: Float,
{
    let max = a.abs().max(b.abs());

    if max > T::one() {
        (a / max, b / max)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_poly_val() {
        assert_eq!(poly_val(2.0, &[1.0, 0.0, 0.0]), 4.0);
        assert_eq!(poly_val(2.0, &[1.0, 2.0, 3.0]), 11.0);
        assert_eq!(poly_val(3.0, &[2.0, 0.0, -1.0, 5.0]), 56.0);
        assert_eq!(poly_val(3.0, &[]), 0.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-1.5, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.5, -1.0, 1.0), 0.5);
        assert_eq!(clamp_unit(-7.0), -1.0);
    }

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(2.25, 1.0), 0.25);
        assert_eq!(rem_euclid(-0.25, 1.0), 0.75);
        assert_eq!(rem_euclid(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_desaturate() {
        assert_eq!(desaturate(0.5, -0.25), (0.5, -0.25));
        assert_eq!(desaturate(2.0, -1.0), (1.0, -0.5));
        assert_eq!(desaturate(-1.5, 0.0), (-1.0, 0.0));
    }
}
