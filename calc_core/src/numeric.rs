//! # Numeric Helpers
//!
//! Rounding, clamping, and display conversions shared by the engine.
//!
//! Every computed result goes through [`round_and_clamp`] before it reaches
//! the display: rounded half away from zero to the configured number of
//! decimal places, then clamped to the range of integers an IEEE-754 double
//! represents exactly.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::numeric::{format_number, round_and_clamp, MAX_SAFE_INTEGER};
//!
//! assert_eq!(round_and_clamp(0.1 + 0.2, 8), 0.3);
//! assert_eq!(round_and_clamp(1e300, 8), MAX_SAFE_INTEGER);
//! assert_eq!(format_number(8.0), "8");
//! ```

// ============================================================================
// Constants
// ============================================================================

/// Largest integer a double represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Decimal places beyond this cannot change an f64
const MAX_PLACES: i64 = 308;

// ============================================================================
// Rounding and Clamping
// ============================================================================

/// Round `value` to `places` decimal digits, half away from zero.
///
/// Negative `places` round to tens, hundreds, and so on. Non-finite values,
/// and values too large to scale without overflowing, come back unchanged.
pub fn round_to(value: f64, places: i64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let places = places.clamp(-MAX_PLACES, MAX_PLACES) as i32;
    if places >= 0 {
        let factor = 10f64.powi(places);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }
        scaled.round() / factor
    } else {
        let divisor = 10f64.powi(-places);
        (value / divisor).round() * divisor
    }
}

/// Clamp `value` to `[-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER]`.
pub fn clamp_safe(value: f64) -> f64 {
    value.clamp(-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER)
}

/// Round then clamp; the post-processing applied to every binary result.
pub fn round_and_clamp(value: f64, places: i64) -> f64 {
    clamp_safe(round_to(value, places))
}

// ============================================================================
// Display Conversions
// ============================================================================

/// Render a number the way the display shows it.
///
/// Integral values print without a fraction and negative zero prints as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Parse display text into a finite number.
///
/// Returns `None` for error markers, empty text, and anything that does not
/// parse to a finite value (`inf`, `NaN`).
pub fn parse_display(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
