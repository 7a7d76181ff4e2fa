//! Storefront
//!
//! Prices a cart for a customer. Active coupons and the customer's spend are
//! loaded once per quote; every line is then evaluated and priced in memory.

mod models;
mod service;

pub use models::*;
pub use service::*;
