//! Numeric conversion helpers centralizing yard and probability casts.

use num_traits::cast::cast;

/// Round a f64 yard value to whole yards, clamping to the i32 range.
///
/// Non-finite inputs collapse to zero so a degenerate contest never leaks a
/// NaN into the field position.
#[must_use]
pub fn round_yards(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(value.clamp(min, max).round()).unwrap_or(0)
}

/// Floor a f64 yard value (used when a multiplier may only shrink a gain).
#[must_use]
pub fn floor_yards(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(value.clamp(min, max).floor()).unwrap_or(0)
}

/// Clamp a probability into `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Convert a rating byte into the contest scale.
#[must_use]
pub fn rating(value: u8) -> f64 {
    f64::from(value)
}

/// Convert a count into f64 for averaging.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a signed yard total into f64 for index math.
#[must_use]
pub fn yards_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Seconds on the game clock, rounded and clamped to `u32`.
#[must_use]
pub fn round_seconds(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u32>(value.min(f64::from(u32::MAX)).round()).unwrap_or(0)
}

/// Cubic smoothstep on `[0, 1]`.
#[must_use]
pub fn smoothstep(t: f64) -> f64 {
    let t = clamp_probability(t);
    t * t * 2.0f64.mul_add(-t, 3.0)
}
