//! Currency amount helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Floats only appear at the boundary, where `amount_from_f64` converts them.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of decimal places kept for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest accepted magnitude for a single amount (10^15).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Errors raised when converting a raw number into a currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// NaN or infinity.
    #[error("value is not a finite number")]
    NonFinite,

    /// Magnitude above `MAX_AMOUNT`.
    #[error("value exceeds the maximum supported amount")]
    OutOfRange,
}

/// Rounds an amount to currency precision, midpoints away from zero.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if `difference` is within `tolerance` in absolute terms.
#[must_use]
pub fn within_tolerance(difference: Decimal, tolerance: Decimal) -> bool {
    difference.abs() <= tolerance
}

/// Converts a raw floating-point value into a currency amount.
///
/// Non-finite values are rejected rather than coerced.
pub fn amount_from_f64(value: f64) -> Result<Decimal, AmountError> {
    if !value.is_finite() {
        return Err(AmountError::NonFinite);
    }

    let amount = Decimal::from_f64(value).ok_or(AmountError::OutOfRange)?;
    if amount.abs() > MAX_AMOUNT {
        return Err(AmountError::OutOfRange);
    }

    Ok(round_currency(amount))
}

#[cfg(test)]
#[path = "amount_tests.rs"]
mod tests;
