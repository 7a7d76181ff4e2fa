//! Coupon request and response bodies.
//!
//! Money and percentages travel as decimal strings and timestamps as RFC 3339
//! strings, so no precision is lost on the way in or out.

use std::{str::FromStr, string::ToString};

use jiff::Timestamp;
use redeem::{
    conditions::{CustomerConditions, OrderCondition, UsageConditions},
    coupons::{Coupon, CouponType},
    discounts::{BuyXGetY, Discount, DiscountType, Minimum},
    pricing::round_price,
};
use redeem_app::domain::coupons::{
    data::{NewBuyXGetY, NewCoupon, NewCustomerConditions, NewOrderCondition},
    records::CouponSummary,
};
use rust_decimal::Decimal;
use salvo::{oapi::ToSchema, prelude::StatusError};
use serde::{Deserialize, Serialize};

use crate::extensions::*;

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, StatusError> {
    Decimal::from_str(value.trim()).or_400(&format!("could not parse {field}"))
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp, StatusError> {
    value
        .parse::<Timestamp>()
        .or_400(&format!("could not parse {field}"))
}

fn parse_optional_decimal(field: &str, value: Option<&str>) -> Result<Option<Decimal>, StatusError> {
    value.map(|value| parse_decimal(field, value)).transpose()
}

const fn default_status() -> bool {
    true
}

/// Create Coupon Request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCouponRequest {
    /// Unique, case-sensitive code
    pub code: String,

    /// `manual` (needs the code entered) or `automatic`
    pub coupon_type: String,

    pub description: Option<String>,

    #[serde(default = "default_status")]
    pub status: bool,

    /// `fixed`, `percentage` or `buy_x_get_y`
    pub discount_type: String,

    /// Amount off (fixed) or percent off (percentage), as a decimal string
    pub discount_value: Option<String>,

    pub buy_x_get_y: Option<BuyXGetYBody>,

    /// RFC 3339 timestamp
    pub start_timestamp: String,

    /// RFC 3339 timestamp
    pub end_timestamp: String,

    /// Variant ids or SKUs the coupon is limited to
    #[serde(default)]
    pub specific_target_products: Vec<String>,

    pub customer_conditions: Option<CustomerConditionsBody>,

    #[serde(default)]
    pub usage_conditions: UsageConditionsBody,

    #[serde(default)]
    pub order_conditions: Vec<OrderConditionBody>,
}

/// Buy-x-get-y terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct BuyXGetYBody {
    pub buy_min_quantity: Option<u32>,
    pub buy_min_amount: Option<String>,

    /// `product`, `variant`, `collection` or `category`
    pub buy_entity: String,
    pub buy_ids: Vec<String>,

    pub get_quantity: u32,
    pub get_discount_percent: String,
    pub get_entity: String,
    pub get_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CustomerConditionsBody {
    /// Customer tier; the other customer fields are ignored without it
    pub customer_groups: Option<String>,
    pub min_purchased_amount: Option<String>,

    #[serde(default)]
    pub customer_emails: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct UsageConditionsBody {
    pub max_total_uses: Option<u32>,

    #[serde(default)]
    pub one_use_per_customer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderConditionBody {
    /// `price`, `product`, `variant`, `collection` or `category`
    pub condition_type: String,

    pub operator: String,
    pub value_decimal: Option<String>,

    #[serde(default)]
    pub value_ids: Vec<String>,

    #[serde(default)]
    pub min_quantity: u32,
}

impl CreateCouponRequest {
    /// Decode the wire shape. Domain rules are checked by the service.
    pub(crate) fn into_new_coupon(self) -> Result<(NewCoupon, CouponType), StatusError> {
        let coupon_type = self.coupon_type.parse::<CouponType>().or_400("invalid coupon_type")?;
        let discount_type = self
            .discount_type
            .parse::<DiscountType>()
            .or_400("invalid discount_type")?;

        let buy_x_get_y = self
            .buy_x_get_y
            .map(BuyXGetYBody::into_new_buy_x_get_y)
            .transpose()?;

        let customer_conditions = self
            .customer_conditions
            .map(|body| -> Result<_, StatusError> {
                Ok(NewCustomerConditions {
                    customer_groups: body.customer_groups,
                    min_purchased_amount: parse_optional_decimal(
                        "min_purchased_amount",
                        body.min_purchased_amount.as_deref(),
                    )?,
                    customer_emails: body.customer_emails,
                })
            })
            .transpose()?;

        let order_conditions = self
            .order_conditions
            .into_iter()
            .map(|body| {
                Ok(NewOrderCondition {
                    value_decimal: parse_optional_decimal(
                        "value_decimal",
                        body.value_decimal.as_deref(),
                    )?,
                    condition_type: body.condition_type,
                    operator: body.operator,
                    value_ids: body.value_ids,
                    min_quantity: body.min_quantity,
                })
            })
            .collect::<Result<Vec<_>, StatusError>>()?;

        let coupon = NewCoupon {
            code: self.code,
            description: self.description,
            status: self.status,
            discount_type,
            discount_value: parse_optional_decimal(
                "discount_value",
                self.discount_value.as_deref(),
            )?,
            buy_x_get_y,
            start_timestamp: parse_timestamp("start_timestamp", &self.start_timestamp)?,
            end_timestamp: parse_timestamp("end_timestamp", &self.end_timestamp)?,
            specific_target_products: self.specific_target_products,
            customer_conditions,
            usage_conditions: UsageConditions {
                max_total_uses: self.usage_conditions.max_total_uses,
                one_use_per_customer: self.usage_conditions.one_use_per_customer,
            },
            order_conditions,
        };

        Ok((coupon, coupon_type))
    }
}

impl BuyXGetYBody {
    fn into_new_buy_x_get_y(self) -> Result<NewBuyXGetY, StatusError> {
        Ok(NewBuyXGetY {
            buy_min_quantity: self.buy_min_quantity,
            buy_min_amount: parse_optional_decimal("buy_min_amount", self.buy_min_amount.as_deref())?,
            buy_entity: self.buy_entity,
            buy_ids: self.buy_ids,
            get_quantity: self.get_quantity,
            get_discount_percent: parse_decimal(
                "get_discount_percent",
                &self.get_discount_percent,
            )?,
            get_entity: self.get_entity,
            get_ids: self.get_ids,
        })
    }
}

impl From<&BuyXGetY> for BuyXGetYBody {
    fn from(terms: &BuyXGetY) -> Self {
        let buy = terms.buy();
        let get = terms.get();

        let (buy_min_quantity, buy_min_amount) = match buy.requirement {
            Minimum::Quantity(quantity) => (Some(quantity), None),
            Minimum::Amount(amount) => (None, Some(round_price(amount).to_string())),
        };

        Self {
            buy_min_quantity,
            buy_min_amount,
            buy_entity: buy.entity.as_str().to_string(),
            buy_ids: buy.ids.to_vec(),
            get_quantity: get.quantity,
            get_discount_percent: get.discount_percent.value().to_string(),
            get_entity: get.entity.as_str().to_string(),
            get_ids: get.ids.to_vec(),
        }
    }
}

/// Discount terms as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountResponse {
    pub discount_type: String,
    pub discount_value: Option<String>,
    pub buy_x_get_y: Option<BuyXGetYBody>,
}

impl From<&Discount> for DiscountResponse {
    fn from(discount: &Discount) -> Self {
        let buy_x_get_y = match discount {
            Discount::BuyXGetY(terms) => Some(terms.into()),
            Discount::Fixed(_) | Discount::Percentage(_) => None,
        };

        Self {
            discount_type: discount.discount_type().as_str().to_string(),
            discount_value: discount.value().map(|value| value.to_string()),
            buy_x_get_y,
        }
    }
}

/// A coupon listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponSummaryResponse {
    pub id: i64,
    pub code: String,
    pub coupon_type: String,
    pub description: Option<String>,
    pub status: bool,
    pub discount: DiscountResponse,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub usage_conditions: UsageConditionsBody,
    pub created_at: String,
}

impl From<CouponSummary> for CouponSummaryResponse {
    fn from(coupon: CouponSummary) -> Self {
        Self {
            id: coupon.id.into_i64(),
            code: coupon.code.into_string(),
            coupon_type: coupon.coupon_type.as_str().to_string(),
            description: coupon.description,
            status: coupon.status,
            discount: (&coupon.discount).into(),
            start_timestamp: coupon.validity.start().to_string(),
            end_timestamp: coupon.validity.end().to_string(),
            usage_conditions: coupon.usage.into(),
            created_at: coupon.created_at.to_string(),
        }
    }
}

impl From<UsageConditions> for UsageConditionsBody {
    fn from(usage: UsageConditions) -> Self {
        Self {
            max_total_uses: usage.max_total_uses,
            one_use_per_customer: usage.one_use_per_customer,
        }
    }
}

/// Customer restrictions as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CustomerConditionsResponse {
    pub customer_group: Option<String>,
    pub min_purchased_amount: Option<String>,
    pub customer_emails: Vec<String>,
}

impl From<&CustomerConditions> for CustomerConditionsResponse {
    fn from(customer: &CustomerConditions) -> Self {
        Self {
            customer_group: customer.group.as_ref().map(|group| group.as_str().to_string()),
            min_purchased_amount: customer.min_purchased_amount.map(|amount| amount.to_string()),
            customer_emails: customer.emails.to_vec(),
        }
    }
}

impl From<&OrderCondition> for OrderConditionBody {
    fn from(condition: &OrderCondition) -> Self {
        let parts = condition.predicate.to_parts();

        Self {
            condition_type: parts.kind.as_str().to_string(),
            operator: parts.operator.as_str().to_string(),
            value_decimal: parts.value_decimal.as_ref().map(ToString::to_string),
            value_ids: parts.value_ids,
            min_quantity: condition.min_quantity,
        }
    }
}

/// A coupon with every attached condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponResponse {
    pub id: i64,
    pub code: String,
    pub coupon_type: String,
    pub description: Option<String>,
    pub status: bool,
    pub discount: DiscountResponse,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub specific_target_products: Vec<String>,
    pub customer_conditions: Option<CustomerConditionsResponse>,
    pub usage_conditions: UsageConditionsBody,
    pub order_conditions: Vec<OrderConditionBody>,
    pub created_at: String,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id.into_i64(),
            discount: (&coupon.discount).into(),
            start_timestamp: coupon.validity.start().to_string(),
            end_timestamp: coupon.validity.end().to_string(),
            specific_target_products: coupon.targets.ids().to_vec(),
            customer_conditions: coupon.customer.as_ref().map(Into::into),
            usage_conditions: coupon.usage.into(),
            order_conditions: coupon.order_conditions.iter().map(Into::into).collect(),
            created_at: coupon.created_at.to_string(),
            coupon_type: coupon.coupon_type.as_str().to_string(),
            code: coupon.code.into_string(),
            description: coupon.description,
            status: coupon.status,
        }
    }
}
