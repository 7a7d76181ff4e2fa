//! Eligibility
//!
//! Decides whether a coupon applies to a line for a customer at an instant.
//! Predicates run in a fixed order and evaluation stops at the first failure,
//! whose reason is reported. "Not applicable" is an ordinary outcome, never an
//! error.

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    conditions::{CustomerConditions, CustomerGroup},
    coupons::{Coupon, WindowPosition},
    items::LineItem,
};

/// A known customer. Guests are represented by the absence of one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    /// Email address, as stored.
    pub email: Option<String>,

    /// Tiers the customer belongs to.
    pub groups: Vec<CustomerGroup>,

    /// Historical purchase total, supplied by the spend lookup. `None` when unknown.
    pub purchased_total: Option<Decimal>,
}

impl Customer {
    /// A customer identified by email.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Whether the customer belongs to `group`.
    pub fn belongs_to(&self, group: &CustomerGroup) -> bool {
        group.is_everyone() || self.groups.contains(group)
    }
}

/// Why a coupon does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ineligibility {
    /// The coupon is switched off.
    Disabled,

    /// The validity window has not opened.
    NotStarted,

    /// The validity window has closed.
    Expired,

    /// The coupon targets other variants.
    VariantNotTargeted,

    /// The customer is not in the required tier.
    CustomerGroupMismatch,

    /// The customer's email is not on the allow-list.
    EmailNotAllowed,

    /// The customer has not spent enough, or their spend is unknown.
    InsufficientPurchaseHistory,

    /// An order condition does not hold for the line.
    OrderConditionNotMet,
}

impl Ineligibility {
    /// Machine-readable reason code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Ineligibility::Disabled => "disabled",
            Ineligibility::NotStarted => "not_started",
            Ineligibility::Expired => "expired",
            Ineligibility::VariantNotTargeted => "variant_not_targeted",
            Ineligibility::CustomerGroupMismatch => "customer_group_mismatch",
            Ineligibility::EmailNotAllowed => "email_not_allowed",
            Ineligibility::InsufficientPurchaseHistory => "insufficient_purchase_history",
            Ineligibility::OrderConditionNotMet => "order_condition_not_met",
        }
    }
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Every active predicate passed.
    Applicable,

    /// The first predicate that failed.
    NotApplicable(Ineligibility),
}

impl Eligibility {
    /// Whether the coupon applies.
    pub const fn is_applicable(self) -> bool {
        matches!(self, Eligibility::Applicable)
    }
}

impl From<Result<(), Ineligibility>> for Eligibility {
    fn from(result: Result<(), Ineligibility>) -> Self {
        match result {
            Ok(()) => Eligibility::Applicable,
            Err(reason) => Eligibility::NotApplicable(reason),
        }
    }
}

/// Evaluate a coupon against a line.
pub fn evaluate(
    coupon: &Coupon,
    line: &LineItem,
    customer: Option<&Customer>,
    now: Timestamp,
) -> Eligibility {
    check_line(coupon, line, customer, now).into()
}

/// Evaluate a cart-level coupon, skipping the per-line predicates.
///
/// Buy-x-get-y coupons scope themselves through their own groups, so targets
/// and order conditions are not consulted.
pub fn evaluate_for_cart(coupon: &Coupon, customer: Option<&Customer>, now: Timestamp) -> Eligibility {
    check_availability(coupon, now)
        .and_then(|()| check_customer(coupon.customer.as_ref(), customer))
        .into()
}

/// The coupons applicable to a line, in listing order.
pub fn applicable_coupons<'a>(
    coupons: &'a [Coupon],
    line: &LineItem,
    customer: Option<&Customer>,
    now: Timestamp,
) -> Vec<&'a Coupon> {
    coupons
        .iter()
        .filter(|coupon| evaluate(coupon, line, customer, now).is_applicable())
        .collect()
}

fn check_line(
    coupon: &Coupon,
    line: &LineItem,
    customer: Option<&Customer>,
    now: Timestamp,
) -> Result<(), Ineligibility> {
    check_availability(coupon, now)?;

    if !coupon.targets.admits(line) {
        return Err(Ineligibility::VariantNotTargeted);
    }

    check_customer(coupon.customer.as_ref(), customer)?;

    if !coupon.order_conditions.all_hold(line) {
        return Err(Ineligibility::OrderConditionNotMet);
    }

    Ok(())
}

fn check_availability(coupon: &Coupon, now: Timestamp) -> Result<(), Ineligibility> {
    if !coupon.status {
        return Err(Ineligibility::Disabled);
    }

    match coupon.validity.position(now) {
        WindowPosition::NotStarted => Err(Ineligibility::NotStarted),
        WindowPosition::Expired => Err(Ineligibility::Expired),
        WindowPosition::Open => Ok(()),
    }
}

fn check_customer(
    conditions: Option<&CustomerConditions>,
    customer: Option<&Customer>,
) -> Result<(), Ineligibility> {
    let Some(conditions) = conditions else {
        return Ok(());
    };

    if let Some(group) = &conditions.group {
        let member = group.is_everyone() || customer.is_some_and(|c| c.belongs_to(group));

        if !member {
            return Err(Ineligibility::CustomerGroupMismatch);
        }
    }

    if !conditions.emails.is_empty() {
        let allowed = customer
            .and_then(|c| c.email.as_deref())
            .is_some_and(|email| conditions.emails.contains(email));

        if !allowed {
            return Err(Ineligibility::EmailNotAllowed);
        }
    }

    if let Some(minimum) = conditions.min_purchased_amount {
        let spent = customer.and_then(|c| c.purchased_total);

        if !spent.is_some_and(|total| total >= minimum) {
            return Err(Ineligibility::InsufficientPurchaseHistory);
        }
    }

    Ok(())
}
