//! Redeem
//!
//! Redeem is a coupon rule engine: the condition model, the coupon aggregate,
//! eligibility evaluation and discount calculation. Everything here is pure and
//! synchronous; persistence and transport live in the `redeem-app` and
//! `redeem-json` crates.

pub mod cart;
pub mod conditions;
pub mod coupons;
pub mod discounts;
pub mod eligibility;
pub mod fixtures;
pub mod ids;
pub mod idset;
pub mod items;
pub mod prelude;
pub mod pricing;
