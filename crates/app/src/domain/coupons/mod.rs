//! Coupons

pub mod data;
mod errors;
pub mod query;
pub mod records;
pub mod repositories;
pub mod saga;
pub mod service;

pub use errors::{COUPON_CODE_CONSTRAINT, CouponsServiceError, StoreError, ValidationError};
