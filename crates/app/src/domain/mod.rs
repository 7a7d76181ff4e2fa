//! Redeem Domain Concerns

pub mod coupons;
pub mod customers;
pub mod storefront;
