//! Storefront Models

use jiff::Timestamp;
use redeem::{
    coupons::{Coupon, CouponCode, CouponId},
    discounts::AdjustedCart,
    items::LineItem,
};
use rust_decimal::Decimal;

/// The shopper, as asserted by the storefront. Guests send none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteCustomer {
    pub email: Option<String>,
    pub groups: Vec<String>,
}

/// A cart line and the coupon the shopper picked for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteLine {
    pub item: LineItem,
    pub selected_coupon: Option<CouponId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub customer: Option<QuoteCustomer>,

    /// Codes typed in by the shopper; manual coupons need one of these.
    pub entered_codes: Vec<String>,

    pub lines: Vec<QuoteLine>,
    pub now: Timestamp,
}

/// The identifying fields of a coupon, as shown next to a price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRef {
    pub id: CouponId,
    pub code: CouponCode,
}

impl From<&Coupon> for CouponRef {
    fn from(coupon: &Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code.clone(),
        }
    }
}

/// A priced line. Shown prices are rounded to the minor unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineQuote {
    pub item: LineItem,

    /// Every per-unit coupon that applies, in listing order.
    pub applicable: Vec<CouponRef>,

    /// The coupon priced in: the selected one when it applies, otherwise the first.
    pub applied: Option<CouponRef>,

    pub unit_price: Decimal,
    pub discounted_unit_price: Decimal,
    pub line_total: Decimal,

    /// Discounted unit price at full precision. Cart-level discounts and the
    /// quote total are computed from this, never from the rounded price.
    pub exact_unit_price: Decimal,
}

impl LineQuote {
    /// The line as priced, at full precision.
    pub fn discounted_item(&self) -> LineItem {
        self.item.clone().with_unit_price(self.exact_unit_price)
    }
}

/// A buy-x-get-y coupon applied across the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartDiscount {
    pub coupon: CouponRef,
    pub adjusted: AdjustedCart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub lines: Vec<LineQuote>,
    pub cart_discount: Option<CartDiscount>,

    /// Sum of undiscounted line totals.
    pub subtotal: Decimal,

    /// Amount due after per-unit and cart-level discounts.
    pub total: Decimal,
}
