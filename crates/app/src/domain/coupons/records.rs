//! Coupon Records
//!
//! Row-level shapes of the coupon tables, decoded at the store boundary.

use jiff::Timestamp;
use redeem::{
    conditions::{
        CustomerConditions, CustomerGroup, OrderCondition, OrderConditions, TargetVariants,
        UsageConditions,
    },
    coupons::{Coupon, CouponCode, CouponType, ValidityWindow},
    discounts::Discount,
    idset::IdSet,
    ids::TypedId,
};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

pub use redeem::coupons::CouponId;

/// Target Product Id
pub type TargetProductId = TypedId<TargetProductRecord>;

/// Customer Condition Id
pub type CustomerConditionId = TypedId<CustomerConditionRecord>;

/// Customer Email Id
pub type CustomerEmailId = TypedId<CustomerEmailRecord>;

/// Order Condition Id
pub type OrderConditionId = TypedId<OrderConditionRecord>;

/// Coupon Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    pub id: CouponId,
    pub code: CouponCode,
    pub coupon_type: CouponType,
    pub description: Option<String>,
    pub status: bool,
    pub discount: Discount,
    pub validity: ValidityWindow,
    pub usage: UsageConditions,
    pub created_at: Timestamp,
}

/// Listing rows carry the coupon row without its condition sets.
pub type CouponSummary = CouponRecord;

/// Coupon row insert payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCouponRow {
    pub code: CouponCode,
    pub coupon_type: CouponType,
    pub description: Option<String>,
    pub status: bool,
    pub discount: Discount,
    pub validity: ValidityWindow,
    pub usage: UsageConditions,
}

/// Target Product Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProductRecord {
    pub id: TargetProductId,
    pub coupon_id: CouponId,
    pub variant_id: String,
}

/// Customer Condition Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerConditionRecord {
    pub id: CustomerConditionId,
    pub coupon_id: CouponId,
    pub customer_group: Option<CustomerGroup>,
    pub min_purchased_amount: Option<Decimal>,
}

/// Customer condition insert payload. Rows are only written for a named group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomerConditionRow {
    pub coupon_id: CouponId,
    pub customer_group: CustomerGroup,
    pub min_purchased_amount: Option<Decimal>,
}

/// Customer Email Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerEmailRecord {
    pub id: CustomerEmailId,
    pub customer_condition_id: CustomerConditionId,
    pub email: String,
}

/// Order Condition Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConditionRecord {
    pub id: OrderConditionId,
    pub coupon_id: CouponId,
    pub condition: OrderCondition,
}

/// Everything stored for a set of coupons, grouped for assembly.
#[derive(Debug, Default)]
pub(crate) struct CouponRows {
    pub targets: Vec<TargetProductRecord>,
    pub customer_conditions: Vec<CustomerConditionRecord>,
    pub emails: Vec<CustomerEmailRecord>,
    pub order_conditions: Vec<OrderConditionRecord>,
}

impl CouponRows {
    /// Assemble aggregates, keeping the order of `coupons`.
    ///
    /// When several customer condition rows exist for a coupon, the one with the
    /// lowest id is used.
    pub(crate) fn assemble(self, coupons: Vec<CouponRecord>) -> Vec<Coupon> {
        let mut targets: FxHashMap<CouponId, Vec<String>> = FxHashMap::default();

        for target in self.targets {
            targets
                .entry(target.coupon_id)
                .or_default()
                .push(target.variant_id);
        }

        let mut emails: FxHashMap<CustomerConditionId, Vec<String>> = FxHashMap::default();

        for email in self.emails {
            emails
                .entry(email.customer_condition_id)
                .or_default()
                .push(email.email);
        }

        let mut customers: FxHashMap<CouponId, CustomerConditionRecord> = FxHashMap::default();

        for condition in self.customer_conditions {
            match customers.get(&condition.coupon_id) {
                Some(existing) if existing.id < condition.id => {}
                _ => {
                    customers.insert(condition.coupon_id, condition);
                }
            }
        }

        let mut orders: FxHashMap<CouponId, Vec<(OrderConditionId, OrderCondition)>> =
            FxHashMap::default();

        for order in self.order_conditions {
            orders
                .entry(order.coupon_id)
                .or_default()
                .push((order.id, order.condition));
        }

        coupons
            .into_iter()
            .map(|record| {
                let customer = customers.remove(&record.id).map(|condition| {
                    CustomerConditions {
                        group: condition.customer_group,
                        min_purchased_amount: condition.min_purchased_amount,
                        emails: IdSet::new(emails.remove(&condition.id).unwrap_or_default()),
                    }
                });

                let mut order_conditions = orders.remove(&record.id).unwrap_or_default();

                order_conditions.sort_by_key(|(id, _)| *id);

                Coupon {
                    id: record.id,
                    code: record.code,
                    coupon_type: record.coupon_type,
                    description: record.description,
                    status: record.status,
                    discount: record.discount,
                    validity: record.validity,
                    usage: record.usage,
                    targets: TargetVariants::new(targets.remove(&record.id).unwrap_or_default()),
                    customer,
                    order_conditions: OrderConditions::new(
                        order_conditions.into_iter().map(|(_, condition)| condition),
                    ),
                    created_at: record.created_at,
                }
            })
            .collect()
    }
}
