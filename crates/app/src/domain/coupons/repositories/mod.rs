//! Coupon Repositories
//!
//! One typed method per table operation. Nothing here spans tables: the
//! creation and deletion protocols sequence these calls themselves.

use std::fmt;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use redeem::{conditions::OrderCondition, coupons::ValidityWindow};

use crate::domain::coupons::{
    StoreError,
    query::CouponQuery,
    records::{
        CouponId, CouponRecord, CustomerConditionId, CustomerConditionRecord, CustomerEmailId,
        CustomerEmailRecord, NewCouponRow, NewCustomerConditionRow, OrderConditionId,
        OrderConditionRecord, TargetProductId, TargetProductRecord,
    },
};

mod memory;
mod postgres;

pub use memory::{InMemoryCouponsRepository, RowCounts};
pub use postgres::PgCouponsRepository;

/// A single store round trip, used for failure injection and call tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FindCouponByCode,
    InsertCoupon,
    GetCoupon,
    UpdateCouponStatus,
    UpdateCouponValidity,
    DeleteCoupon,
    SearchCoupons,
    ListActiveCoupons,
    InsertTargetProducts,
    ListTargetProducts,
    DeleteTargetProducts,
    InsertCustomerCondition,
    ListCustomerConditions,
    DeleteCustomerConditions,
    InsertCustomerEmails,
    ListCustomerEmails,
    DeleteCustomerEmails,
    InsertOrderConditions,
    ListOrderConditions,
    DeleteOrderConditions,
}

impl StoreOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FindCouponByCode => "find_coupon_by_code",
            Self::InsertCoupon => "insert_coupon",
            Self::GetCoupon => "get_coupon",
            Self::UpdateCouponStatus => "update_coupon_status",
            Self::UpdateCouponValidity => "update_coupon_validity",
            Self::DeleteCoupon => "delete_coupon",
            Self::SearchCoupons => "search_coupons",
            Self::ListActiveCoupons => "list_active_coupons",
            Self::InsertTargetProducts => "insert_target_products",
            Self::ListTargetProducts => "list_target_products",
            Self::DeleteTargetProducts => "delete_target_products",
            Self::InsertCustomerCondition => "insert_customer_condition",
            Self::ListCustomerConditions => "list_customer_conditions",
            Self::DeleteCustomerConditions => "delete_customer_conditions",
            Self::InsertCustomerEmails => "insert_customer_emails",
            Self::ListCustomerEmails => "list_customer_emails",
            Self::DeleteCustomerEmails => "delete_customer_emails",
            Self::InsertOrderConditions => "insert_order_conditions",
            Self::ListOrderConditions => "list_order_conditions",
            Self::DeleteOrderConditions => "delete_order_conditions",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[automock]
#[async_trait]
pub trait CouponsRepository: Send + Sync {
    /// Exact, case-sensitive code lookup.
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<CouponId>, StoreError>;

    async fn insert_coupon(&self, coupon: &NewCouponRow) -> Result<CouponRecord, StoreError>;

    async fn get_coupon(&self, id: CouponId) -> Result<Option<CouponRecord>, StoreError>;

    /// Returns `false` when no row has the id.
    async fn update_coupon_status(&self, id: CouponId, status: bool) -> Result<bool, StoreError>;

    /// Returns `false` when no row has the id.
    async fn update_coupon_validity(
        &self,
        id: CouponId,
        validity: ValidityWindow,
    ) -> Result<bool, StoreError>;

    /// Returns the number of rows deleted.
    async fn delete_coupon(&self, id: CouponId) -> Result<u64, StoreError>;

    /// A page of coupon rows, newest first, with the total number of matches.
    async fn search_coupons(
        &self,
        query: &CouponQuery,
    ) -> Result<(Vec<CouponRecord>, u64), StoreError>;

    /// Enabled coupons whose window contains `now`, in id order.
    async fn list_active_coupons(&self, now: Timestamp) -> Result<Vec<CouponRecord>, StoreError>;

    async fn insert_target_products(
        &self,
        coupon: CouponId,
        variant_ids: &[String],
    ) -> Result<Vec<TargetProductId>, StoreError>;

    async fn list_target_products(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<TargetProductRecord>, StoreError>;

    async fn delete_target_products(&self, ids: &[TargetProductId]) -> Result<u64, StoreError>;

    async fn insert_customer_condition(
        &self,
        condition: &NewCustomerConditionRow,
    ) -> Result<CustomerConditionId, StoreError>;

    async fn list_customer_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<CustomerConditionRecord>, StoreError>;

    async fn delete_customer_conditions(
        &self,
        ids: &[CustomerConditionId],
    ) -> Result<u64, StoreError>;

    async fn insert_customer_emails(
        &self,
        condition: CustomerConditionId,
        emails: &[String],
    ) -> Result<Vec<CustomerEmailId>, StoreError>;

    async fn list_customer_emails(
        &self,
        conditions: &[CustomerConditionId],
    ) -> Result<Vec<CustomerEmailRecord>, StoreError>;

    async fn delete_customer_emails(&self, ids: &[CustomerEmailId]) -> Result<u64, StoreError>;

    async fn insert_order_conditions(
        &self,
        coupon: CouponId,
        conditions: &[OrderCondition],
    ) -> Result<Vec<OrderConditionId>, StoreError>;

    async fn list_order_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<OrderConditionRecord>, StoreError>;

    async fn delete_order_conditions(&self, ids: &[OrderConditionId]) -> Result<u64, StoreError>;
}
