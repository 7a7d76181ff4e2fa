//! In-Memory Coupons Repository
//!
//! Behaves like the Postgres schema: codes are unique, children cascade with
//! their parent, and ids come from one increasing sequence. Individual
//! operations can be made to fail so the creation protocol's compensation can
//! be exercised.

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use redeem::{conditions::OrderCondition, coupons::ValidityWindow, ids::TypedId};
use rustc_hash::FxHashSet;
use tokio::sync::Mutex;

use crate::domain::coupons::{
    StoreError,
    errors::COUPON_CODE_CONSTRAINT,
    query::CouponQuery,
    records::{
        CouponId, CouponRecord, CustomerConditionId, CustomerConditionRecord, CustomerEmailId,
        CustomerEmailRecord, NewCouponRow, NewCustomerConditionRow, OrderConditionId,
        OrderConditionRecord, TargetProductId, TargetProductRecord,
    },
    repositories::{CouponsRepository, StoreOperation},
};

/// Rows held per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub coupons: usize,
    pub target_products: usize,
    pub customer_conditions: usize,
    pub customer_emails: usize,
    pub order_conditions: usize,
}

impl RowCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    sequence: i64,
    coupons: BTreeMap<CouponId, CouponRecord>,
    target_products: BTreeMap<TargetProductId, TargetProductRecord>,
    customer_conditions: BTreeMap<CustomerConditionId, CustomerConditionRecord>,
    customer_emails: BTreeMap<CustomerEmailId, CustomerEmailRecord>,
    order_conditions: BTreeMap<OrderConditionId, OrderConditionRecord>,
    failing: FxHashSet<StoreOperation>,
    calls: Vec<StoreOperation>,
}

impl MemoryState {
    fn call(&mut self, operation: StoreOperation) -> Result<(), StoreError> {
        self.calls.push(operation);

        if self.failing.contains(&operation) {
            return Err(StoreError::Injected(operation));
        }

        Ok(())
    }

    fn next_id<T>(&mut self) -> TypedId<T> {
        self.sequence += 1;

        TypedId::new(self.sequence)
    }

    fn remove_coupon(&mut self, id: CouponId) -> bool {
        if self.coupons.remove(&id).is_none() {
            return false;
        }

        self.target_products
            .retain(|_, target| target.coupon_id != id);
        self.order_conditions
            .retain(|_, condition| condition.coupon_id != id);

        let conditions: Vec<CustomerConditionId> = self
            .customer_conditions
            .values()
            .filter(|condition| condition.coupon_id == id)
            .map(|condition| condition.id)
            .collect();

        self.remove_customer_conditions(&conditions);

        true
    }

    fn remove_customer_conditions(&mut self, ids: &[CustomerConditionId]) -> u64 {
        let mut removed = 0;

        for id in ids {
            if self.customer_conditions.remove(id).is_some() {
                removed += 1;
            }
        }

        self.customer_emails
            .retain(|_, email| !ids.contains(&email.customer_condition_id));

        removed
    }
}

fn remove_all<K: Ord, V>(rows: &mut BTreeMap<K, V>, ids: &[K]) -> u64 {
    let mut removed = 0;

    for id in ids {
        if rows.remove(id).is_some() {
            removed += 1;
        }
    }

    removed
}

#[derive(Debug, Default)]
pub struct InMemoryCouponsRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryCouponsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail with [`StoreError::Injected`].
    #[must_use]
    pub fn failing_on(mut self, operation: StoreOperation) -> Self {
        self.state.get_mut().failing.insert(operation);
        self
    }

    /// Every operation attempted so far, in order, including failed ones.
    pub async fn calls(&self) -> Vec<StoreOperation> {
        self.state.lock().await.calls.clone()
    }

    pub async fn row_counts(&self) -> RowCounts {
        let state = self.state.lock().await;

        RowCounts {
            coupons: state.coupons.len(),
            target_products: state.target_products.len(),
            customer_conditions: state.customer_conditions.len(),
            customer_emails: state.customer_emails.len(),
            order_conditions: state.order_conditions.len(),
        }
    }
}

#[async_trait]
impl CouponsRepository for InMemoryCouponsRepository {
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<CouponId>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::FindCouponByCode)?;

        Ok(state
            .coupons
            .values()
            .find(|coupon| coupon.code.as_str() == code)
            .map(|coupon| coupon.id))
    }

    async fn insert_coupon(&self, coupon: &NewCouponRow) -> Result<CouponRecord, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::InsertCoupon)?;

        if state
            .coupons
            .values()
            .any(|existing| existing.code == coupon.code)
        {
            return Err(StoreError::UniqueViolation(
                COUPON_CODE_CONSTRAINT.to_string(),
            ));
        }

        let record = CouponRecord {
            id: state.next_id(),
            code: coupon.code.clone(),
            coupon_type: coupon.coupon_type,
            description: coupon.description.clone(),
            status: coupon.status,
            discount: coupon.discount.clone(),
            validity: coupon.validity,
            usage: coupon.usage,
            created_at: Timestamp::now(),
        };

        state.coupons.insert(record.id, record.clone());

        Ok(record)
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<CouponRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::GetCoupon)?;

        Ok(state.coupons.get(&id).cloned())
    }

    async fn update_coupon_status(&self, id: CouponId, status: bool) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::UpdateCouponStatus)?;

        let Some(coupon) = state.coupons.get_mut(&id) else {
            return Ok(false);
        };

        coupon.status = status;

        Ok(true)
    }

    async fn update_coupon_validity(
        &self,
        id: CouponId,
        validity: ValidityWindow,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::UpdateCouponValidity)?;

        let Some(coupon) = state.coupons.get_mut(&id) else {
            return Ok(false);
        };

        coupon.validity = validity;

        Ok(true)
    }

    async fn delete_coupon(&self, id: CouponId) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::DeleteCoupon)?;

        Ok(u64::from(state.remove_coupon(id)))
    }

    async fn search_coupons(
        &self,
        query: &CouponQuery,
    ) -> Result<(Vec<CouponRecord>, u64), StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::SearchCoupons)?;

        let mut matches: Vec<&CouponRecord> = state
            .coupons
            .values()
            .filter(|coupon| {
                query
                    .code_filter()
                    .is_none_or(|code| coupon.code.as_str().contains(code))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = u64::try_from(matches.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.effective_limit()).unwrap_or(usize::MAX);

        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn list_active_coupons(&self, now: Timestamp) -> Result<Vec<CouponRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::ListActiveCoupons)?;

        Ok(state
            .coupons
            .values()
            .filter(|coupon| coupon.status && coupon.validity.contains(now))
            .cloned()
            .collect())
    }

    async fn insert_target_products(
        &self,
        coupon: CouponId,
        variant_ids: &[String],
    ) -> Result<Vec<TargetProductId>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::InsertTargetProducts)?;

        let mut ids = Vec::with_capacity(variant_ids.len());

        for variant_id in variant_ids {
            let id = state.next_id();

            state.target_products.insert(
                id,
                TargetProductRecord {
                    id,
                    coupon_id: coupon,
                    variant_id: variant_id.clone(),
                },
            );

            ids.push(id);
        }

        Ok(ids)
    }

    async fn list_target_products(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<TargetProductRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::ListTargetProducts)?;

        Ok(state
            .target_products
            .values()
            .filter(|target| coupons.contains(&target.coupon_id))
            .cloned()
            .collect())
    }

    async fn delete_target_products(&self, ids: &[TargetProductId]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::DeleteTargetProducts)?;

        Ok(remove_all(&mut state.target_products, ids))
    }

    async fn insert_customer_condition(
        &self,
        condition: &NewCustomerConditionRow,
    ) -> Result<CustomerConditionId, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::InsertCustomerCondition)?;

        let id = state.next_id();

        state.customer_conditions.insert(
            id,
            CustomerConditionRecord {
                id,
                coupon_id: condition.coupon_id,
                customer_group: Some(condition.customer_group.clone()),
                min_purchased_amount: condition.min_purchased_amount,
            },
        );

        Ok(id)
    }

    async fn list_customer_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<CustomerConditionRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::ListCustomerConditions)?;

        Ok(state
            .customer_conditions
            .values()
            .filter(|condition| coupons.contains(&condition.coupon_id))
            .cloned()
            .collect())
    }

    async fn delete_customer_conditions(
        &self,
        ids: &[CustomerConditionId],
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::DeleteCustomerConditions)?;

        Ok(state.remove_customer_conditions(ids))
    }

    async fn insert_customer_emails(
        &self,
        condition: CustomerConditionId,
        emails: &[String],
    ) -> Result<Vec<CustomerEmailId>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::InsertCustomerEmails)?;

        let mut ids = Vec::with_capacity(emails.len());

        for email in emails {
            let id = state.next_id();

            state.customer_emails.insert(
                id,
                CustomerEmailRecord {
                    id,
                    customer_condition_id: condition,
                    email: email.clone(),
                },
            );

            ids.push(id);
        }

        Ok(ids)
    }

    async fn list_customer_emails(
        &self,
        conditions: &[CustomerConditionId],
    ) -> Result<Vec<CustomerEmailRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::ListCustomerEmails)?;

        Ok(state
            .customer_emails
            .values()
            .filter(|email| conditions.contains(&email.customer_condition_id))
            .cloned()
            .collect())
    }

    async fn delete_customer_emails(&self, ids: &[CustomerEmailId]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::DeleteCustomerEmails)?;

        Ok(remove_all(&mut state.customer_emails, ids))
    }

    async fn insert_order_conditions(
        &self,
        coupon: CouponId,
        conditions: &[OrderCondition],
    ) -> Result<Vec<OrderConditionId>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::InsertOrderConditions)?;

        let mut ids = Vec::with_capacity(conditions.len());

        for condition in conditions {
            let id = state.next_id();

            state.order_conditions.insert(
                id,
                OrderConditionRecord {
                    id,
                    coupon_id: coupon,
                    condition: condition.clone(),
                },
            );

            ids.push(id);
        }

        Ok(ids)
    }

    async fn list_order_conditions(
        &self,
        coupons: &[CouponId],
    ) -> Result<Vec<OrderConditionRecord>, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::ListOrderConditions)?;

        Ok(state
            .order_conditions
            .values()
            .filter(|condition| coupons.contains(&condition.coupon_id))
            .cloned()
            .collect())
    }

    async fn delete_order_conditions(&self, ids: &[OrderConditionId]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;

        state.call(StoreOperation::DeleteOrderConditions)?;

        Ok(remove_all(&mut state.order_conditions, ids))
    }
}
