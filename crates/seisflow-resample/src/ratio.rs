//! Rational approximation of a resampling ratio.
//!
//! Each integer factor of the reduced fraction becomes a concrete buffer
//! size and filter order downstream, so only small exact ratios are
//! acceptable; anything that fails the bounded search is rejected rather
//! than approximated further.

pub const DEFAULT_EPSILON: f64 = 1e-5;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Reduce `value` to a fraction `num/den` via continued-fraction
/// convergents.
///
/// Returns `None` when no convergent lands within `epsilon` before the
/// iteration cap, or when a convergent would exceed `i32::MAX`. Callers
/// must treat `None` as an incompatible rate, never fall back to a looser
/// approximation.
pub fn reduce(value: f64, epsilon: f64, max_iterations: usize) -> Option<(i64, i64)> {
    const OVERFLOW: i64 = i32::MAX as i64;

    if !value.is_finite() {
        return None;
    }

    let mut r0 = value;
    let mut a0 = r0 as i64;
    if a0.abs() > OVERFLOW {
        return None;
    }

    // (Almost) integral arguments short-circuit the iteration.
    if (a0 as f64 - value).abs() < epsilon {
        return Some((a0, 1));
    }

    let mut p0: i64 = 1;
    let mut q0: i64 = 0;
    let mut p1: i64 = a0;
    let mut q1: i64 = 1;
    let mut p2: i64;
    let mut q2: i64;

    let mut n = 0;
    loop {
        n += 1;
        let r1 = 1.0 / (r0 - a0 as f64);
        let a1 = r1 as i64;
        p2 = a1.checked_mul(p1)?.checked_add(p0)?;
        q2 = a1.checked_mul(q1)?.checked_add(q0)?;
        if p2.abs() > OVERFLOW || q2.abs() > OVERFLOW {
            return None;
        }

        let convergent = p2 as f64 / q2 as f64;
        if n < max_iterations && (convergent - value).abs() > epsilon && q2 < OVERFLOW {
            p0 = p1;
            p1 = p2;
            q0 = q1;
            q1 = q2;
            a0 = a1;
            r0 = r1;
        } else {
            break;
        }
    }

    if n >= max_iterations {
        return None;
    }

    if q2 < OVERFLOW {
        Some((p2, q2))
    } else {
        Some((p1, q1))
    }
}

/// `reduce` with the tolerances every production call site uses.
pub fn reduce_default(value: f64) -> Option<(i64, i64)> {
    reduce(value, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ratio_short_circuits() {
        assert_eq!(reduce_default(100.0 / 25.0), Some((4, 1)));
        assert_eq!(reduce_default(4.0000001), Some((4, 1)));
    }

    #[test]
    fn fractional_ratios_reduce() {
        assert_eq!(reduce_default(40.0 / 100.0), Some((2, 5)));
        assert_eq!(reduce_default(1.0 / 3.0), Some((1, 3)));
        assert_eq!(reduce_default(50.0 / 80.0), Some((5, 8)));
    }

    // Documents the boundary behavior for the near-integer-thirds case:
    // 50/3 is within 1e-5 of 49.999999/3, so the search succeeds.
    #[test]
    fn near_rational_converges_to_neighbor() {
        assert_eq!(reduce_default(49.999999 / 3.0), Some((50, 3)));
    }

    #[test]
    fn rejects_non_finite_and_huge_values() {
        assert_eq!(reduce_default(f64::NAN), None);
        assert_eq!(reduce_default(f64::INFINITY), None);
        assert_eq!(reduce_default(1e12), None);
    }

    #[test]
    fn tiny_ratio_collapses_to_zero() {
        // Within epsilon of zero; the caller ends up building no stages.
        assert_eq!(reduce_default(1e-15), Some((0, 1)));
    }

    #[test]
    fn overflow_guard_stops_unreachable_precision() {
        // No convergent of pi with a denominator below i32::MAX gets
        // within 1e-20.
        assert_eq!(reduce(std::f64::consts::PI, 1e-20, 100), None);
    }

    #[test]
    fn iteration_cap_is_enforced() {
        assert_eq!(reduce(std::f64::consts::PI, 1e-20, 3), None);
    }

    #[test]
    fn convergents_stay_reduced() {
        let (num, den) = reduce_default(0.625).unwrap();
        assert_eq!((num, den), (5, 8));
    }
}
