//! Coupons service errors.

use redeem::{
    conditions::PredicateError,
    coupons::{CouponCodeError, InvertedWindow},
    discounts::{BuyXGetYError, DiscountError},
    items::UnknownEntityKind,
};
use rust_decimal::Decimal;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::coupons::repositories::StoreOperation;

/// Name of the unique constraint on `coupons.code`.
pub const COUPON_CODE_CONSTRAINT: &str = "coupons_code_key";

/// Reasons a coupon creation request is rejected before any write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Code(#[from] CouponCodeError),

    #[error(transparent)]
    Window(#[from] InvertedWindow),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error(transparent)]
    BuyXGetY(#[from] BuyXGetYError),

    #[error(transparent)]
    Entity(#[from] UnknownEntityKind),

    #[error("{0} discounts require a discount value")]
    MissingDiscountValue(&'static str),

    #[error("buy_x_get_y discounts take no discount value")]
    UnexpectedDiscountValue,

    #[error("buy_x_get_y discounts require buy and get groups")]
    MissingBuyXGetY,

    #[error("only buy_x_get_y discounts take buy and get groups")]
    UnexpectedBuyXGetY,

    #[error("buy group needs exactly one of a minimum quantity or a minimum amount")]
    BuyRequirement,

    #[error("target product ids must not be empty")]
    EmptyTarget,

    #[error("customer group must not be empty")]
    EmptyCustomerGroup,

    #[error("customer emails must not be empty")]
    EmptyEmail,

    #[error("invalid customer email: {0}")]
    InvalidEmail(String),

    #[error("minimum purchased amount must be non-negative with at most two decimal places, got {0}")]
    MinPurchasedAmount(Decimal),

    #[error("order condition {index}: {source}")]
    OrderCondition {
        index: usize,
        #[source]
        source: PredicateError,
    },
}

/// Failures talking to the coupon store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error")]
    Sql(#[source] Error),

    #[error("unique constraint {0} violated")]
    UniqueViolation(String),

    #[error("row not found")]
    RowNotFound,

    #[error("store failed during {0}")]
    Injected(StoreOperation),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::RowNotFound;
        }

        let constraint = error
            .as_database_error()
            .filter(|database_error| database_error.kind() == ErrorKind::UniqueViolation)
            .map(|database_error| database_error.constraint().unwrap_or_default().to_string());

        match constraint {
            Some(constraint) => Self::UniqueViolation(constraint),
            None => Self::Sql(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon code already exists")]
    DuplicateCode,

    #[error("coupon not found")]
    NotFound,

    #[error("invalid coupon")]
    Validation(#[from] ValidationError),

    #[error("persistence failure")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for CouponsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(ref constraint) if constraint == COUPON_CODE_CONSTRAINT => {
                Self::DuplicateCode
            }
            StoreError::RowNotFound => Self::NotFound,
            other => Self::Persistence(other),
        }
    }
}

impl From<Error> for CouponsServiceError {
    fn from(error: Error) -> Self {
        StoreError::from(error).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_constraint_maps_to_duplicate_code() {
        let error = CouponsServiceError::from(StoreError::UniqueViolation(
            COUPON_CODE_CONSTRAINT.to_string(),
        ));

        assert!(matches!(error, CouponsServiceError::DuplicateCode));
    }

    #[test]
    fn other_constraints_stay_persistence_failures() {
        let error =
            CouponsServiceError::from(StoreError::UniqueViolation("something_else".to_string()));

        assert!(matches!(
            error,
            CouponsServiceError::Persistence(StoreError::UniqueViolation(_))
        ));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            CouponsServiceError::from(Error::RowNotFound),
            CouponsServiceError::NotFound
        ));
    }
}
