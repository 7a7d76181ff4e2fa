//! Coupon Data
//!
//! The admin creation contract and its validation into insert payloads.

use jiff::Timestamp;
use redeem::{
    conditions::{
        ConditionKind, CustomerGroup, Operator, OrderCondition, Predicate, PredicateParts,
        UsageConditions,
    },
    coupons::{CouponCode, CouponType, ValidityWindow},
    discounts::{BuyGroup, BuyXGetY, Discount, DiscountType, GetGroup, Minimum},
    idset::IdSet,
    items::EntityKind,
    pricing::{Percent, has_minor_unit_precision},
};
use rust_decimal::Decimal;
use validator::validate_email;

use crate::domain::coupons::{
    ValidationError,
    records::{CouponId, NewCouponRow, NewCustomerConditionRow},
};

/// Coupon creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub code: String,
    pub description: Option<String>,
    pub status: bool,
    pub discount_type: DiscountType,

    /// Required for fixed and percentage discounts, absent for buy-x-get-y.
    pub discount_value: Option<Decimal>,

    /// Required for buy-x-get-y, absent otherwise.
    pub buy_x_get_y: Option<NewBuyXGetY>,

    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,

    /// Variant ids or SKUs; empty targets every variant.
    pub specific_target_products: Vec<String>,

    pub customer_conditions: Option<NewCustomerConditions>,
    pub usage_conditions: UsageConditions,
    pub order_conditions: Vec<NewOrderCondition>,
}

/// Buy-x-get-y terms as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuyXGetY {
    pub buy_min_quantity: Option<u32>,
    pub buy_min_amount: Option<Decimal>,
    pub buy_entity: String,
    pub buy_ids: Vec<String>,
    pub get_quantity: u32,
    pub get_discount_percent: Decimal,
    pub get_entity: String,
    pub get_ids: Vec<String>,
}

/// Customer restrictions as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomerConditions {
    pub customer_groups: Option<String>,
    pub min_purchased_amount: Option<Decimal>,
    pub customer_emails: Vec<String>,
}

/// Order condition as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderCondition {
    pub condition_type: String,
    pub operator: String,
    pub value_decimal: Option<Decimal>,
    pub value_ids: Vec<String>,
    pub min_quantity: u32,
}

/// A validated creation request, ready for the creation protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCoupon {
    pub coupon: NewCouponRow,
    pub targets: Vec<String>,
    pub customer: Option<ValidatedCustomerConditions>,

    /// Customer fields submitted without a group; these are not persisted.
    pub ignored_customer_fields: bool,

    pub order_conditions: Vec<OrderCondition>,
}

/// Customer condition row and its emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCustomerConditions {
    pub group: CustomerGroup,
    pub min_purchased_amount: Option<Decimal>,
    pub emails: Vec<String>,
}

impl ValidatedCustomerConditions {
    pub fn row(&self, coupon_id: CouponId) -> NewCustomerConditionRow {
        NewCustomerConditionRow {
            coupon_id,
            customer_group: self.group.clone(),
            min_purchased_amount: self.min_purchased_amount,
        }
    }
}

impl NewCoupon {
    /// Check every field before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self, coupon_type: CouponType) -> Result<ValidatedCoupon, ValidationError> {
        let code = CouponCode::parse(self.code)?;
        let validity = ValidityWindow::new(self.start_timestamp, self.end_timestamp)?;
        let discount = build_discount(self.discount_type, self.discount_value, self.buy_x_get_y)?;

        if self.specific_target_products.iter().any(String::is_empty) {
            return Err(ValidationError::EmptyTarget);
        }

        let (customer, ignored_customer_fields) = match self.customer_conditions {
            Some(conditions) => validate_customer(conditions)?,
            None => (None, false),
        };

        let order_conditions = self
            .order_conditions
            .into_iter()
            .enumerate()
            .map(|(index, condition)| {
                condition
                    .into_condition()
                    .map_err(|source| ValidationError::OrderCondition { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedCoupon {
            coupon: NewCouponRow {
                code,
                coupon_type,
                description: self.description,
                status: self.status,
                discount,
                validity,
                usage: self.usage_conditions,
            },
            targets: dedup_in_order(self.specific_target_products),
            customer,
            ignored_customer_fields,
            order_conditions,
        })
    }
}

fn build_discount(
    discount_type: DiscountType,
    value: Option<Decimal>,
    buy_x_get_y: Option<NewBuyXGetY>,
) -> Result<Discount, ValidationError> {
    match (discount_type, value, buy_x_get_y) {
        (DiscountType::BuyXGetY, None, Some(terms)) => terms.into_discount(),
        (DiscountType::BuyXGetY, Some(_), _) => Err(ValidationError::UnexpectedDiscountValue),
        (DiscountType::BuyXGetY, None, None) => Err(ValidationError::MissingBuyXGetY),
        (_, _, Some(_)) => Err(ValidationError::UnexpectedBuyXGetY),
        (kind, None, None) => Err(ValidationError::MissingDiscountValue(kind.as_str())),
        (DiscountType::Fixed, Some(amount), None) => Ok(Discount::fixed(amount)?),
        (DiscountType::Percentage, Some(percent), None) => Ok(Discount::percentage(percent)?),
    }
}

impl NewBuyXGetY {
    fn into_discount(self) -> Result<Discount, ValidationError> {
        let requirement = match (self.buy_min_quantity, self.buy_min_amount) {
            (Some(quantity), None) => Minimum::Quantity(quantity),
            (None, Some(amount)) => Minimum::Amount(amount),
            _ => return Err(ValidationError::BuyRequirement),
        };

        let buy = BuyGroup {
            requirement,
            entity: self.buy_entity.parse::<EntityKind>()?,
            ids: IdSet::new(self.buy_ids.into_iter().filter(|id| !id.is_empty())),
        };

        let get = GetGroup {
            quantity: self.get_quantity,
            discount_percent: Percent::new(self.get_discount_percent)
                .map_err(redeem::discounts::DiscountError::from)?,
            entity: self.get_entity.parse::<EntityKind>()?,
            ids: IdSet::new(self.get_ids.into_iter().filter(|id| !id.is_empty())),
        };

        Ok(Discount::BuyXGetY(BuyXGetY::new(buy, get)?))
    }
}

impl NewOrderCondition {
    fn into_condition(self) -> Result<OrderCondition, redeem::conditions::PredicateError> {
        let parts = PredicateParts {
            kind: self.condition_type.parse::<ConditionKind>()?,
            operator: self.operator.parse::<Operator>()?,
            value_decimal: self.value_decimal,
            value_ids: self.value_ids,
        };

        Ok(OrderCondition {
            predicate: Predicate::try_from(parts)?,
            min_quantity: self.min_quantity,
        })
    }
}

fn validate_customer(
    conditions: NewCustomerConditions,
) -> Result<(Option<ValidatedCustomerConditions>, bool), ValidationError> {
    for email in &conditions.customer_emails {
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }

        if !validate_email(email.as_str()) {
            return Err(ValidationError::InvalidEmail(email.clone()));
        }
    }

    if let Some(amount) = conditions.min_purchased_amount
        && (amount.is_sign_negative() || !has_minor_unit_precision(amount))
    {
        return Err(ValidationError::MinPurchasedAmount(amount));
    }

    let Some(group) = conditions.customer_groups else {
        let ignored =
            conditions.min_purchased_amount.is_some() || !conditions.customer_emails.is_empty();

        return Ok((None, ignored));
    };

    if group.trim().is_empty() {
        return Err(ValidationError::EmptyCustomerGroup);
    }

    Ok((
        Some(ValidatedCustomerConditions {
            group: CustomerGroup::new(group),
            min_purchased_amount: conditions.min_purchased_amount,
            emails: dedup_in_order(conditions.customer_emails),
        }),
        false,
    ))
}

fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();

    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use jiff::ToSpan;
    use redeem::{conditions::PredicateError, coupons::CouponCodeError, discounts::DiscountError};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    /// A valid percentage coupon request open for the next day.
    pub(crate) fn new_coupon(code: &str) -> NewCoupon {
        let now = Timestamp::now();

        NewCoupon {
            code: code.to_string(),
            description: Some("Spring sale".to_string()),
            status: true,
            discount_type: DiscountType::Percentage,
            discount_value: Some(dec!(20)),
            buy_x_get_y: None,
            start_timestamp: now - 1.hour(),
            end_timestamp: now + 24.hours(),
            specific_target_products: Vec::new(),
            customer_conditions: None,
            usage_conditions: UsageConditions::default(),
            order_conditions: Vec::new(),
        }
    }

    #[test]
    fn valid_request_produces_insert_payloads() -> TestResult {
        let request = NewCoupon {
            specific_target_products: vec!["VAR-1".into(), "VAR-2".into(), "VAR-1".into()],
            customer_conditions: Some(NewCustomerConditions {
                customer_groups: Some("vip".into()),
                min_purchased_amount: Some(dec!(100)),
                customer_emails: vec!["a@x.com".into()],
            }),
            order_conditions: vec![NewOrderCondition {
                condition_type: "price".into(),
                operator: "greater_or_equal".into(),
                value_decimal: Some(dec!(10)),
                value_ids: Vec::new(),
                min_quantity: 2,
            }],
            ..new_coupon("SPRING20")
        };

        let validated = request.validate(CouponType::Automatic)?;

        assert_eq!(validated.coupon.code.as_str(), "SPRING20");
        assert_eq!(validated.targets, ["VAR-1", "VAR-2"]);
        assert!(!validated.ignored_customer_fields);
        assert_eq!(
            validated.customer.map(|customer| customer.group),
            Some(CustomerGroup::new("vip"))
        );
        assert_eq!(
            validated.order_conditions,
            [OrderCondition {
                predicate: Predicate::PriceGreaterOrEqual(dec!(10)),
                min_quantity: 2,
            }]
        );

        Ok(())
    }

    #[test]
    fn rejects_bad_codes() {
        let empty = new_coupon("").validate(CouponType::Manual);
        let padded = new_coupon(" SAVE ").validate(CouponType::Manual);
        let long = new_coupon(&"X".repeat(65)).validate(CouponType::Manual);

        assert_eq!(empty, Err(ValidationError::Code(CouponCodeError::Empty)));
        assert_eq!(
            padded,
            Err(ValidationError::Code(CouponCodeError::SurroundingWhitespace))
        );
        assert_eq!(long, Err(ValidationError::Code(CouponCodeError::TooLong(65))));
    }

    #[test]
    fn rejects_inverted_window() {
        let request = new_coupon("BACKWARDS");
        let request = NewCoupon {
            start_timestamp: request.end_timestamp,
            end_timestamp: request.start_timestamp,
            ..request
        };

        assert!(matches!(
            request.validate(CouponType::Automatic),
            Err(ValidationError::Window(_))
        ));
    }

    #[test]
    fn discount_value_must_match_discount_type() {
        let missing = NewCoupon {
            discount_value: None,
            ..new_coupon("MISSING")
        };
        let negative = NewCoupon {
            discount_type: DiscountType::Fixed,
            discount_value: Some(dec!(-5)),
            ..new_coupon("NEGATIVE")
        };
        let bxgy_with_value = NewCoupon {
            discount_type: DiscountType::BuyXGetY,
            ..new_coupon("B2G1")
        };

        assert_eq!(
            missing.validate(CouponType::Automatic),
            Err(ValidationError::MissingDiscountValue("percentage"))
        );
        assert_eq!(
            negative.validate(CouponType::Automatic),
            Err(ValidationError::Discount(DiscountError::NonPositiveAmount(
                dec!(-5)
            )))
        );
        assert_eq!(
            bxgy_with_value.validate(CouponType::Automatic),
            Err(ValidationError::UnexpectedDiscountValue)
        );
    }

    #[test]
    fn buy_x_get_y_needs_exactly_one_minimum() {
        let terms = NewBuyXGetY {
            buy_min_quantity: Some(2),
            buy_min_amount: Some(dec!(50)),
            buy_entity: "product".into(),
            buy_ids: vec!["tee".into()],
            get_quantity: 1,
            get_discount_percent: dec!(100),
            get_entity: "product".into(),
            get_ids: vec!["tee".into()],
        };

        let request = NewCoupon {
            discount_type: DiscountType::BuyXGetY,
            discount_value: None,
            buy_x_get_y: Some(terms.clone()),
            ..new_coupon("B2G1")
        };

        assert_eq!(
            request.clone().validate(CouponType::Automatic),
            Err(ValidationError::BuyRequirement)
        );

        let fixed = NewCoupon {
            buy_x_get_y: Some(NewBuyXGetY {
                buy_min_amount: None,
                ..terms
            }),
            ..request
        };

        assert!(fixed.validate(CouponType::Automatic).is_ok());
    }

    #[test]
    fn rejects_malformed_emails_and_empty_targets() {
        let bad_email = NewCoupon {
            customer_conditions: Some(NewCustomerConditions {
                customer_groups: Some("vip".into()),
                customer_emails: vec!["not-an-email".into()],
                ..NewCustomerConditions::default()
            }),
            ..new_coupon("EMAILS")
        };
        let empty_target = NewCoupon {
            specific_target_products: vec![String::new()],
            ..new_coupon("TARGETS")
        };

        assert_eq!(
            bad_email.validate(CouponType::Automatic),
            Err(ValidationError::InvalidEmail("not-an-email".into()))
        );
        assert_eq!(
            empty_target.validate(CouponType::Automatic),
            Err(ValidationError::EmptyTarget)
        );
    }

    #[test]
    fn customer_fields_without_group_are_flagged_not_persisted() -> TestResult {
        let request = NewCoupon {
            customer_conditions: Some(NewCustomerConditions {
                customer_groups: None,
                min_purchased_amount: Some(dec!(10)),
                customer_emails: vec!["a@x.com".into()],
            }),
            ..new_coupon("NOGROUP")
        };

        let validated = request.validate(CouponType::Automatic)?;

        assert!(validated.customer.is_none());
        assert!(validated.ignored_customer_fields);

        Ok(())
    }

    #[test]
    fn order_condition_errors_carry_their_index() {
        let request = NewCoupon {
            order_conditions: vec![
                NewOrderCondition {
                    condition_type: "product".into(),
                    operator: "in".into(),
                    value_decimal: None,
                    value_ids: vec!["tee".into()],
                    min_quantity: 0,
                },
                NewOrderCondition {
                    condition_type: "price".into(),
                    operator: "in".into(),
                    value_decimal: Some(dec!(5)),
                    value_ids: Vec::new(),
                    min_quantity: 0,
                },
            ],
            ..new_coupon("ORDERS")
        };

        assert_eq!(
            request.validate(CouponType::Automatic),
            Err(ValidationError::OrderCondition {
                index: 1,
                source: PredicateError::UnsupportedOperator {
                    kind: ConditionKind::Price,
                    operator: Operator::In,
                },
            })
        );
    }
}
