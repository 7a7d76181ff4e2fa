//! Coupon Cleanup
//!
//! The store offers no transaction across the coupon tables, so rows written by
//! the creation protocol are registered here and removed again when a later
//! step fails. Deletion reuses the same ordering.

use std::fmt;

use tracing::{debug, warn};

use crate::domain::coupons::{
    StoreError,
    records::{CouponId, CustomerConditionId, CustomerEmailId, OrderConditionId, TargetProductId},
    repositories::CouponsRepository,
};

/// One delete issued by a cleanup, listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanupStep {
    Coupon,
    CustomerCondition,
    CustomerEmails,
    TargetProducts,
    OrderConditions,
}

impl CleanupStep {
    pub const ORDER: [CleanupStep; 5] = [
        CleanupStep::Coupon,
        CleanupStep::CustomerCondition,
        CleanupStep::CustomerEmails,
        CleanupStep::TargetProducts,
        CleanupStep::OrderConditions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CleanupStep::Coupon => "coupon",
            CleanupStep::CustomerCondition => "customer_condition",
            CleanupStep::CustomerEmails => "customer_emails",
            CleanupStep::TargetProducts => "target_products",
            CleanupStep::OrderConditions => "order_conditions",
        }
    }
}

impl fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows to remove, whatever order they were registered in.
#[derive(Debug, Default)]
pub struct Cleanup {
    coupon: Option<CouponId>,
    customer_conditions: Vec<CustomerConditionId>,
    emails: Vec<CustomerEmailId>,
    targets: Vec<TargetProductId>,
    order_conditions: Vec<OrderConditionId>,
}

impl Cleanup {
    pub fn coupon(&mut self, id: CouponId) {
        self.coupon = Some(id);
    }

    pub fn customer_condition(&mut self, id: CustomerConditionId) {
        self.customer_conditions.push(id);
    }

    pub fn customer_conditions(&mut self, ids: impl IntoIterator<Item = CustomerConditionId>) {
        self.customer_conditions.extend(ids);
    }

    pub fn emails(&mut self, ids: impl IntoIterator<Item = CustomerEmailId>) {
        self.emails.extend(ids);
    }

    pub fn targets(&mut self, ids: impl IntoIterator<Item = TargetProductId>) {
        self.targets.extend(ids);
    }

    pub fn order_conditions(&mut self, ids: impl IntoIterator<Item = OrderConditionId>) {
        self.order_conditions.extend(ids);
    }

    /// Steps with something registered, in execution order.
    pub fn pending(&self) -> Vec<CleanupStep> {
        CleanupStep::ORDER
            .into_iter()
            .filter(|step| self.has(*step))
            .collect()
    }

    fn has(&self, step: CleanupStep) -> bool {
        match step {
            CleanupStep::Coupon => self.coupon.is_some(),
            CleanupStep::CustomerCondition => !self.customer_conditions.is_empty(),
            CleanupStep::CustomerEmails => !self.emails.is_empty(),
            CleanupStep::TargetProducts => !self.targets.is_empty(),
            CleanupStep::OrderConditions => !self.order_conditions.is_empty(),
        }
    }

    async fn execute(
        &self,
        repository: &dyn CouponsRepository,
        step: CleanupStep,
    ) -> Result<u64, StoreError> {
        match step {
            CleanupStep::Coupon => match self.coupon {
                Some(id) => repository.delete_coupon(id).await,
                None => Ok(0),
            },
            CleanupStep::CustomerCondition => {
                repository
                    .delete_customer_conditions(&self.customer_conditions)
                    .await
            }
            CleanupStep::CustomerEmails => repository.delete_customer_emails(&self.emails).await,
            CleanupStep::TargetProducts => repository.delete_target_products(&self.targets).await,
            CleanupStep::OrderConditions => {
                repository
                    .delete_order_conditions(&self.order_conditions)
                    .await
            }
        }
    }

    /// Compensate a failed creation. Every step runs; failures are logged and
    /// swallowed so the caller can surface the error that triggered cleanup.
    pub async fn compensate(self, repository: &dyn CouponsRepository) {
        for step in self.pending() {
            match self.execute(repository, step).await {
                Ok(rows) => debug!(%step, rows, "compensation step completed"),
                Err(error) => warn!(%step, error = %error, "compensation step failed"),
            }
        }
    }

    /// Delete every registered row, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing step's [`StoreError`]. A missing coupon row is
    /// reported as [`StoreError::RowNotFound`] before any child row is touched.
    pub async fn delete(self, repository: &dyn CouponsRepository) -> Result<(), StoreError> {
        for step in self.pending() {
            let rows = self.execute(repository, step).await?;

            if step == CleanupStep::Coupon && rows == 0 {
                return Err(StoreError::RowNotFound);
            }

            debug!(%step, rows, "deletion step completed");
        }

        Ok(())
    }
}
