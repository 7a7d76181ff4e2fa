//! Discounts
//!
//! Per-unit price transforms for fixed and percentage coupons, and the
//! cart-level buy-x-get-y operation in [`buy_x_get_y`].

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    coupons::Coupon,
    pricing::{Percent, PercentError, has_minor_unit_precision},
};

pub mod buy_x_get_y;

pub use buy_x_get_y::{
    AdjustedCart, AdjustedLine, BuyGroup, BuyXGetY, BuyXGetYError, GetGroup, Minimum,
    apply_buy_x_get_y,
};

/// Errors constructing a [`Discount`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Fixed amounts must be strictly positive.
    #[error("fixed discount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Fixed amounts share the currency's minor-unit precision.
    #[error("fixed discount may have at most two decimal places, got {0}")]
    AmountPrecision(Decimal),

    /// Percentage out of range or too precise.
    #[error(transparent)]
    Percent(#[from] PercentError),

    /// Malformed buy-x-get-y groups.
    #[error(transparent)]
    BuyXGetY(#[from] BuyXGetYError),
}

/// The stored discount type of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountType {
    /// Fixed amount off each unit.
    Fixed,

    /// Percentage off each unit.
    Percentage,

    /// Cart-level buy-x-get-y.
    BuyXGetY,
}

impl DiscountType {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            DiscountType::Fixed => "fixed",
            DiscountType::Percentage => "percentage",
            DiscountType::BuyXGetY => "buy_x_get_y",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discount type string that is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown discount type: {0}")]
pub struct UnknownDiscountType(pub String);

impl FromStr for DiscountType {
    type Err = UnknownDiscountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" | "fixed_product" => Ok(DiscountType::Fixed),
            "percentage" | "percentage_product" => Ok(DiscountType::Percentage),
            "buy_x_get_y" => Ok(DiscountType::BuyXGetY),
            other => Err(UnknownDiscountType(other.to_string())),
        }
    }
}

/// The discount terms of a coupon. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discount {
    /// Amount taken off each unit.
    Fixed(Decimal),

    /// Percentage taken off each unit.
    Percentage(Percent),

    /// Discounted units granted when enough qualifying units are in the cart.
    BuyXGetY(BuyXGetY),
}

impl Discount {
    /// A validated fixed discount.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError`] for zero, negative or sub-minor-unit amounts.
    pub fn fixed(amount: Decimal) -> Result<Self, DiscountError> {
        if amount <= Decimal::ZERO {
            return Err(DiscountError::NonPositiveAmount(amount));
        }

        if !has_minor_unit_precision(amount) {
            return Err(DiscountError::AmountPrecision(amount));
        }

        Ok(Discount::Fixed(amount))
    }

    /// A validated percentage discount.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::Percent`] when the percentage is out of range.
    pub fn percentage(percent: Decimal) -> Result<Self, DiscountError> {
        Ok(Discount::Percentage(Percent::new(percent)?))
    }

    /// The stored discount type.
    pub const fn discount_type(&self) -> DiscountType {
        match self {
            Discount::Fixed(_) => DiscountType::Fixed,
            Discount::Percentage(_) => DiscountType::Percentage,
            Discount::BuyXGetY(_) => DiscountType::BuyXGetY,
        }
    }

    /// The stored `discount_value`: the amount or percentage, absent for buy-x-get-y.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Discount::Fixed(amount) => Some(*amount),
            Discount::Percentage(percent) => Some(percent.value()),
            Discount::BuyXGetY(_) => None,
        }
    }

    /// Whether this discount transforms unit prices.
    pub const fn is_per_unit(&self) -> bool {
        !matches!(self, Discount::BuyXGetY(_))
    }

    /// The unrounded discounted unit price, clamped into `[0, base]`.
    ///
    /// Buy-x-get-y leaves the price unchanged; see [`apply_buy_x_get_y`].
    pub fn apply_to_unit(&self, base: Decimal) -> Decimal {
        let discounted = match self {
            Discount::Fixed(amount) => base - amount,
            Discount::Percentage(percent) => percent.discount(base),
            Discount::BuyXGetY(_) => base,
        };

        clamp_price(discounted, base)
    }
}

/// Clamp a discounted price into `[0, base]`. Negative bases clamp to zero.
fn clamp_price(discounted: Decimal, base: Decimal) -> Decimal {
    discounted.min(base).max(Decimal::ZERO)
}

/// The unrounded price of one unit after applying `coupon`.
///
/// Pure: the same inputs always yield the same output, never below zero and
/// never above `base`.
pub fn calculate_discounted_price(base: Decimal, coupon: Option<&Coupon>) -> Decimal {
    match coupon {
        None => base,
        Some(coupon) => coupon.discount.apply_to_unit(base),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fixed_discount_floors_at_zero() -> TestResult {
        let discount = Discount::fixed(dec!(150))?;

        assert_eq!(discount.apply_to_unit(dec!(100.00)), Decimal::ZERO);
        assert_eq!(discount.apply_to_unit(dec!(200.00)), dec!(50.00));

        Ok(())
    }

    #[test]
    fn percentage_discount_scales_price() -> TestResult {
        let discount = Discount::percentage(dec!(20))?;

        assert_eq!(discount.apply_to_unit(dec!(1000.00)), dec!(800.00));

        let full = Discount::percentage(dec!(100))?;

        assert_eq!(full.apply_to_unit(dec!(9.99)), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn percentage_is_not_rounded_before_surfacing() -> TestResult {
        let discount = Discount::percentage(dec!(33))?;

        assert_eq!(discount.apply_to_unit(dec!(0.99)), dec!(0.6633));

        Ok(())
    }

    #[test]
    fn constructors_validate_terms() {
        assert_eq!(
            Discount::fixed(Decimal::ZERO),
            Err(DiscountError::NonPositiveAmount(Decimal::ZERO))
        );
        assert_eq!(
            Discount::fixed(dec!(1.005)),
            Err(DiscountError::AmountPrecision(dec!(1.005)))
        );
        assert!(matches!(
            Discount::percentage(dec!(101)),
            Err(DiscountError::Percent(PercentError::OutOfRange(_)))
        ));
    }

    #[test]
    fn clamp_keeps_negative_bases_at_zero() {
        assert_eq!(clamp_price(dec!(-5), dec!(-1)), Decimal::ZERO);
        assert_eq!(clamp_price(dec!(12), dec!(10)), dec!(10));
    }

    #[test]
    fn discount_type_round_trips_through_strings() -> TestResult {
        for discount_type in [
            DiscountType::Fixed,
            DiscountType::Percentage,
            DiscountType::BuyXGetY,
        ] {
            assert_eq!(discount_type.as_str().parse::<DiscountType>()?, discount_type);
        }

        assert_eq!("fixed_product".parse::<DiscountType>()?, DiscountType::Fixed);

        Ok(())
    }

    #[test]
    fn value_is_absent_for_buy_x_get_y() -> TestResult {
        assert_eq!(Discount::fixed(dec!(5))?.value(), Some(dec!(5)));
        assert_eq!(Discount::percentage(dec!(10))?.value(), Some(dec!(10)));
        assert!(Discount::fixed(dec!(5))?.is_per_unit());

        Ok(())
    }
}
