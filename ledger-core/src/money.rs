//! Money conversion utilities using rust_decimal for precision
//!
//! Amounts are stored as `f64` (2dp) in the data model. Every calculation
//! converts to `Decimal`, accumulates without rounding, and rounds once
//! when the visible total is produced.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal; non-finite input becomes zero
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert an amount, quantity or rate that must not be negative.
///
/// Negative, NaN and infinite values are treated as 0.
#[inline]
pub fn sanitize(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    to_decimal(value)
}

/// Round to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or(0.0)
}

/// Stored form of an input that must not be negative
///
/// Same coercion as [`sanitize`], unrounded, so quantities keep their
/// precision and nothing non-finite ever reaches the store.
#[inline]
pub fn non_negative(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    value
}
