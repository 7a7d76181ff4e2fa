//! Coupon Fixtures

use std::fmt::Display;

use serde::Deserialize;

use crate::{
    conditions::{
        ConditionKind, CustomerConditions, CustomerGroup, Operator, OrderCondition,
        OrderConditions, Predicate, PredicateParts, TargetVariants, UsageConditions,
    },
    coupons::{Coupon, CouponCode, CouponId, CouponType, ValidityWindow},
    discounts::{BuyGroup, BuyXGetY, Discount, GetGroup, Minimum},
    fixtures::{FixtureError, parse_decimal, parse_timestamp},
    idset::IdSet,
    items::EntityKind,
    pricing::Percent,
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupons in listing order
    pub coupons: Vec<CouponFixture>,
}

/// Coupon type as written in YAML
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponTypeFixture {
    /// Needs the code
    Manual,

    /// Applies without a code
    #[default]
    Automatic,
}

/// Coupon Fixture
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Row id
    pub id: i64,

    /// Coupon code
    pub code: String,

    /// Manual or automatic (defaults to automatic)
    #[serde(default, rename = "type")]
    pub coupon_type: CouponTypeFixture,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Enabled flag (defaults to enabled)
    #[serde(default = "enabled")]
    pub status: bool,

    /// Discount terms
    pub discount: DiscountFixture,

    /// Window start, RFC 3339
    pub starts_at: String,

    /// Window end, RFC 3339
    pub ends_at: String,

    /// Creation time (defaults to the window start)
    #[serde(default)]
    pub created_at: Option<String>,

    /// Targeted variant ids or SKUs
    #[serde(default)]
    pub targets: Vec<String>,

    /// Customer restrictions
    #[serde(default)]
    pub customer: Option<CustomerConditionsFixture>,

    /// Order conditions
    #[serde(default)]
    pub order_conditions: Vec<OrderConditionFixture>,

    /// Usage caps
    #[serde(default)]
    pub usage: UsageFixture,
}

fn enabled() -> bool {
    true
}

/// Discount terms as written in YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixture {
    /// Fixed amount off each unit (e.g., "5.00")
    Fixed {
        /// Amount
        value: String,
    },

    /// Percentage off each unit (e.g., "20")
    Percentage {
        /// Percentage
        value: String,
    },

    /// Buy X get Y
    BuyXGetY {
        /// Qualifying group
        buy: BuyGroupFixture,

        /// Granted group
        get: GetGroupFixture,
    },
}

/// Buy group as written in YAML; exactly one of the minimums is set
#[derive(Debug, Deserialize)]
pub struct BuyGroupFixture {
    /// Minimum qualifying units
    #[serde(default)]
    pub min_quantity: Option<u32>,

    /// Minimum qualifying spend
    #[serde(default)]
    pub min_amount: Option<String>,

    /// Entity kind of `ids`
    pub entity: String,

    /// Qualifying ids
    pub ids: Vec<String>,
}

/// Get group as written in YAML
#[derive(Debug, Deserialize)]
pub struct GetGroupFixture {
    /// Units granted
    pub quantity: u32,

    /// Discount percent on granted units
    pub percent: String,

    /// Entity kind of `ids`
    pub entity: String,

    /// Grantable ids
    pub ids: Vec<String>,
}

/// Customer conditions as written in YAML
#[derive(Debug, Deserialize)]
pub struct CustomerConditionsFixture {
    /// Required tier
    #[serde(default)]
    pub group: Option<String>,

    /// Email allow-list
    #[serde(default)]
    pub emails: Vec<String>,

    /// Minimum historical spend
    #[serde(default)]
    pub min_purchased_amount: Option<String>,
}

/// Order condition as written in YAML
#[derive(Debug, Deserialize)]
pub struct OrderConditionFixture {
    /// Condition type
    #[serde(rename = "type")]
    pub kind: String,

    /// Operator
    pub operator: String,

    /// Decimal operand
    #[serde(default)]
    pub value: Option<String>,

    /// Id operands
    #[serde(default)]
    pub ids: Vec<String>,

    /// Minimum line quantity
    #[serde(default)]
    pub min_quantity: u32,
}

/// Usage caps as written in YAML
#[derive(Debug, Default, Deserialize)]
pub struct UsageFixture {
    /// Global cap
    #[serde(default)]
    pub max_total_uses: Option<u32>,

    /// Once per customer
    #[serde(default)]
    pub one_use_per_customer: bool,
}

fn invalid(code: &str, reason: impl Display) -> FixtureError {
    FixtureError::InvalidCoupon {
        code: code.to_string(),
        reason: reason.to_string(),
    }
}

fn entity(code: &str, kind: &str) -> Result<EntityKind, FixtureError> {
    kind.parse::<EntityKind>().map_err(|err| invalid(code, err))
}

impl DiscountFixture {
    fn into_discount(self, code: &str) -> Result<Discount, FixtureError> {
        match self {
            DiscountFixture::Fixed { value } => {
                Discount::fixed(parse_decimal(&value)?).map_err(|err| invalid(code, err))
            }
            DiscountFixture::Percentage { value } => {
                Discount::percentage(parse_decimal(&value)?).map_err(|err| invalid(code, err))
            }
            DiscountFixture::BuyXGetY { buy, get } => {
                let requirement = match (buy.min_quantity, buy.min_amount) {
                    (Some(quantity), None) => Minimum::Quantity(quantity),
                    (None, Some(amount)) => Minimum::Amount(parse_decimal(&amount)?),
                    _ => {
                        return Err(invalid(
                            code,
                            "buy group needs exactly one of min_quantity or min_amount",
                        ));
                    }
                };

                let buy = BuyGroup {
                    requirement,
                    entity: entity(code, &buy.entity)?,
                    ids: IdSet::new(buy.ids),
                };

                let get = GetGroup {
                    quantity: get.quantity,
                    discount_percent: Percent::new(parse_decimal(&get.percent)?)
                        .map_err(|err| invalid(code, err))?,
                    entity: entity(code, &get.entity)?,
                    ids: IdSet::new(get.ids),
                };

                let terms = BuyXGetY::new(buy, get).map_err(|err| invalid(code, err))?;

                Ok(Discount::BuyXGetY(terms))
            }
        }
    }
}

impl OrderConditionFixture {
    fn into_condition(self, code: &str) -> Result<OrderCondition, FixtureError> {
        let value_decimal = self.value.as_deref().map(parse_decimal).transpose()?;

        let parts = PredicateParts {
            kind: self.kind.parse::<ConditionKind>().map_err(|err| invalid(code, err))?,
            operator: self.operator.parse::<Operator>().map_err(|err| invalid(code, err))?,
            value_decimal,
            value_ids: self.ids,
        };

        Ok(OrderCondition {
            predicate: Predicate::try_from(parts).map_err(|err| invalid(code, err))?,
            min_quantity: self.min_quantity,
        })
    }
}

impl TryFrom<CustomerConditionsFixture> for CustomerConditions {
    type Error = FixtureError;

    fn try_from(fixture: CustomerConditionsFixture) -> Result<Self, Self::Error> {
        Ok(CustomerConditions {
            group: fixture.group.map(CustomerGroup::new),
            min_purchased_amount: fixture
                .min_purchased_amount
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
            emails: IdSet::new(fixture.emails),
        })
    }
}

impl TryFrom<CouponFixture> for Coupon {
    type Error = FixtureError;

    fn try_from(fixture: CouponFixture) -> Result<Self, Self::Error> {
        let code = fixture.code;

        let start = parse_timestamp(&fixture.starts_at)?;
        let end = parse_timestamp(&fixture.ends_at)?;
        let created_at = fixture
            .created_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?
            .unwrap_or(start);

        let order_conditions = fixture
            .order_conditions
            .into_iter()
            .map(|condition| condition.into_condition(&code))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Coupon {
            id: CouponId::new(fixture.id),
            coupon_type: match fixture.coupon_type {
                CouponTypeFixture::Manual => CouponType::Manual,
                CouponTypeFixture::Automatic => CouponType::Automatic,
            },
            description: fixture.description,
            status: fixture.status,
            discount: fixture.discount.into_discount(&code)?,
            validity: ValidityWindow::new(start, end).map_err(|err| invalid(&code, err))?,
            usage: UsageConditions {
                max_total_uses: fixture.usage.max_total_uses,
                one_use_per_customer: fixture.usage.one_use_per_customer,
            },
            targets: TargetVariants::new(fixture.targets),
            customer: fixture
                .customer
                .map(CustomerConditions::try_from)
                .transpose()?,
            order_conditions: OrderConditions::new(order_conditions),
            created_at,
            code: CouponCode::parse(code.clone()).map_err(|err| invalid(&code, err))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    const BUY_TWO_GET_ONE: &str = r#"
coupons:
  - id: 7
    code: B2G1
    type: manual
    discount:
      type: buy_x_get_y
      buy: { min_quantity: 2, entity: product, ids: [tee] }
      get: { quantity: 1, percent: "100", entity: product, ids: [tee] }
    starts_at: "2026-01-01T00:00:00Z"
    ends_at: "2026-12-31T23:59:59Z"
    customer:
      group: vip
      min_purchased_amount: "10.00"
    order_conditions:
      - type: price
        operator: greater
        value: "1.00"
    usage:
      max_total_uses: 50
      one_use_per_customer: true
"#;

    #[test]
    fn buy_x_get_y_fixture_converts() -> TestResult {
        let fixture: CouponsFixture = serde_norway::from_str(BUY_TWO_GET_ONE)?;
        let coupon_fixture = fixture.coupons.into_iter().next().ok_or("no coupon")?;
        let coupon = Coupon::try_from(coupon_fixture)?;

        assert_eq!(coupon.coupon_type, CouponType::Manual);
        assert!(coupon.is_cart_level());
        assert_eq!(coupon.created_at, coupon.validity.start());
        assert_eq!(coupon.usage.max_total_uses, Some(50));

        let customer = coupon.customer.ok_or("missing customer conditions")?;

        assert_eq!(customer.group, Some(CustomerGroup::new("vip")));
        assert_eq!(customer.min_purchased_amount, Some(dec!(10.00)));
        assert!(!coupon.order_conditions.is_empty());

        Ok(())
    }

    #[test]
    fn buy_group_requires_one_minimum() -> TestResult {
        let yaml = BUY_TWO_GET_ONE.replace("min_quantity: 2,", "");
        let fixture: CouponsFixture = serde_norway::from_str(&yaml)?;
        let coupon_fixture = fixture.coupons.into_iter().next().ok_or("no coupon")?;

        assert!(matches!(
            Coupon::try_from(coupon_fixture),
            Err(FixtureError::InvalidCoupon { .. })
        ));

        Ok(())
    }
}
