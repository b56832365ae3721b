//! Centralized numeric casts so precision-loss sites stay auditable.

use num_traits::cast::cast;

fn f64_bound_of_i64(bound: i64) -> f64 {
    cast::<i64, f64>(bound).unwrap_or(if bound < 0 { f64::MIN } else { f64::MAX })
}

fn finite_to_i64(value: f64) -> i64 {
    let clamped = value.clamp(f64_bound_of_i64(i64::MIN), f64_bound_of_i64(i64::MAX));
    // The f64 image of i64::MAX rounds past it, so the cast can still miss.
    cast::<f64, i64>(clamped).unwrap_or(if clamped < 0.0 { i64::MIN } else { i64::MAX })
}

/// Widen an i64 into f64, accepting precision loss in this one place.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Round into the i64 range; non-finite inputs become 0.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        finite_to_i64(value.round())
    } else {
        0
    }
}

/// Ceil into the i64 range; non-finite inputs become 0.
#[must_use]
pub fn ceil_f64_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        finite_to_i64(value.ceil())
    } else {
        0
    }
}

/// Widen a usize count into f32, saturating on overflow.
#[must_use]
pub fn usize_to_f32(value: usize) -> f32 {
    cast::<usize, f32>(value).unwrap_or(f32::MAX)
}

/// Integer percentage of a value, truncated toward zero.
#[must_use]
pub const fn pct_of_i64(value: i64, pct: i64) -> i64 {
    value.saturating_mul(pct) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_reject_non_finite_inputs() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(round_f64_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn ceil_rounds_up_and_saturates() {
        assert_eq!(ceil_f64_to_i64(1.2), 2);
        assert_eq!(ceil_f64_to_i64(f64::NAN), 0);
        assert_eq!(ceil_f64_to_i64(1e300), i64::MAX);
    }

    #[test]
    fn pct_truncates_toward_zero() {
        assert_eq!(pct_of_i64(100, 10), 10);
        assert_eq!(pct_of_i64(105, 10), 10);
        assert_eq!(pct_of_i64(0, 40), 0);
    }
}
