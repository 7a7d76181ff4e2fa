//! Coupons
//!
//! The coupon aggregate: the coupon row plus every condition set it owns.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    conditions::{CustomerConditions, OrderConditions, TargetVariants, UsageConditions},
    discounts::Discount,
    ids::TypedId,
};

pub mod code;
pub mod window;

pub use code::{CouponCode, CouponCodeError, MAX_CODE_LENGTH};
pub use window::{InvertedWindow, ValidityWindow, WindowPosition};

/// Coupon row id.
pub type CouponId = TypedId<Coupon>;

/// How a coupon reaches the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CouponType {
    /// Applies only when the customer enters the code.
    Manual,

    /// Applies without a code.
    Automatic,
}

impl CouponType {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            CouponType::Manual => "manual",
            CouponType::Automatic => "automatic",
        }
    }
}

impl fmt::Display for CouponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coupon type string that is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown coupon type: {0}")]
pub struct UnknownCouponType(pub String);

impl FromStr for CouponType {
    type Err = UnknownCouponType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(CouponType::Manual),
            "automatic" => Ok(CouponType::Automatic),
            other => Err(UnknownCouponType(other.to_string())),
        }
    }
}

/// A coupon with its attached conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    /// Row id.
    pub id: CouponId,

    /// Unique, case-sensitive code.
    pub code: CouponCode,

    /// Manual or automatic.
    pub coupon_type: CouponType,

    /// Free-text description for the admin UI.
    pub description: Option<String>,

    /// Enabled flag.
    pub status: bool,

    /// Discount terms. Immutable after creation.
    pub discount: Discount,

    /// When the coupon may be used.
    pub validity: ValidityWindow,

    /// Usage caps.
    pub usage: UsageConditions,

    /// Targeted variants; empty for every variant.
    pub targets: TargetVariants,

    /// Customer restrictions, if a customer condition row exists.
    pub customer: Option<CustomerConditions>,

    /// Order line conditions.
    pub order_conditions: OrderConditions,

    /// Creation time.
    pub created_at: Timestamp,
}

impl Coupon {
    /// Whether the coupon is on offer to a customer who entered `entered_codes`.
    ///
    /// Automatic coupons are always offered. Manual coupons need their exact code.
    pub fn is_offered<S: AsRef<str>>(&self, entered_codes: &[S]) -> bool {
        match self.coupon_type {
            CouponType::Automatic => true,
            CouponType::Manual => entered_codes
                .iter()
                .any(|code| code.as_ref() == self.code.as_str()),
        }
    }

    /// Whether the discount is applied to the whole cart rather than per unit.
    pub const fn is_cart_level(&self) -> bool {
        !self.discount.is_per_unit()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jiff::ToSpan;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    /// An enabled automatic 10% coupon open for the next day.
    pub(crate) fn coupon(code: &str) -> TestResult<Coupon> {
        let now = Timestamp::now();

        Ok(Coupon {
            id: CouponId::new(1),
            code: CouponCode::parse(code)?,
            coupon_type: CouponType::Automatic,
            description: None,
            status: true,
            discount: Discount::percentage(dec!(10))?,
            validity: ValidityWindow::new(now - 1.hour(), now + 24.hours())?,
            usage: UsageConditions::default(),
            targets: TargetVariants::any(),
            customer: None,
            order_conditions: OrderConditions::default(),
            created_at: now,
        })
    }

    #[test]
    fn automatic_coupons_are_always_offered() -> TestResult {
        let coupon = coupon("AUTO")?;

        assert!(coupon.is_offered::<&str>(&[]));

        Ok(())
    }

    #[test]
    fn manual_coupons_need_their_exact_code() -> TestResult {
        let coupon = Coupon {
            coupon_type: CouponType::Manual,
            ..coupon("SAVE10")?
        };

        assert!(!coupon.is_offered::<&str>(&[]));
        assert!(!coupon.is_offered(&["save10"]));
        assert!(coupon.is_offered(&["OTHER", "SAVE10"]));

        Ok(())
    }

    #[test]
    fn coupon_type_parses_stored_form() -> TestResult {
        assert_eq!("manual".parse::<CouponType>()?, CouponType::Manual);
        assert_eq!(CouponType::Automatic.to_string(), "automatic");
        assert!("sometimes".parse::<CouponType>().is_err());

        Ok(())
    }
}
