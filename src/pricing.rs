//! Pricing
//!
//! Prices are plain [`Decimal`] amounts in the store currency. Arithmetic is
//! carried out at full precision; [`round_price`] is applied only where a price
//! is surfaced.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of decimal places in the currency's minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Largest amount a stored price column holds (`NUMERIC(12, 2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Whether `amount` fits the stored price range: not negative and at most [`MAX_PRICE`].
#[must_use]
pub fn is_within_price_range(amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount <= MAX_PRICE
}

/// Round a price half-up to the currency's minor unit.
#[must_use]
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether the amount can be expressed in whole minor units (at most two decimal places).
#[must_use]
pub fn has_minor_unit_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= MINOR_UNIT_SCALE
}

/// Errors constructing a [`Percent`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PercentError {
    /// Percentages must lie in `(0, 100]`.
    #[error("percentage must be greater than 0 and at most 100, got {0}")]
    OutOfRange(Decimal),

    /// Percentages share the minor-unit precision of prices.
    #[error("percentage may have at most two decimal places, got {0}")]
    Precision(Decimal),
}

/// A whole-number style percentage in `(0, 100]`, e.g. `20` for twenty percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(Decimal);

impl Percent {
    /// Validate and wrap a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PercentError`] when the value is out of range or too precise.
    pub fn new(value: Decimal) -> Result<Self, PercentError> {
        if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PercentError::OutOfRange(value));
        }

        if !has_minor_unit_precision(value) {
            return Err(PercentError::Precision(value));
        }

        Ok(Self(value))
    }

    /// The percentage as entered, e.g. `20`.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// The percentage as a fraction, e.g. `0.2`.
    #[must_use]
    pub fn fraction(self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Reduce `price` by this percentage, unrounded.
    #[must_use]
    pub fn discount(self, price: Decimal) -> Decimal {
        price * (Decimal::ONE - self.fraction())
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = PercentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
