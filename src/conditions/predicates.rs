//! Order Condition Predicates
//!
//! Order conditions are stored as generic `type` / `operator` / `value_*` rows.
//! They are decoded once into a [`Predicate`], which carries only the fields its
//! pairing needs, and evaluated through [`Predicate::evaluate`].

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    idset::IdSet,
    items::{EntityKind, LineItem},
    pricing::has_minor_unit_precision,
};

/// What an order condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// The line's unit price.
    Price,

    /// The line's product id.
    Product,

    /// The line's variant id or SKU.
    Variant,

    /// The collections the line's product belongs to.
    Collection,

    /// The categories the line's product belongs to.
    Category,
}

impl ConditionKind {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Price => "price",
            ConditionKind::Product => "product",
            ConditionKind::Variant => "variant",
            ConditionKind::Collection => "collection",
            ConditionKind::Category => "category",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(ConditionKind::Price),
            "product" => Ok(ConditionKind::Product),
            "variant" => Ok(ConditionKind::Variant),
            "collection" => Ok(ConditionKind::Collection),
            "category" => Ok(ConditionKind::Category),
            other => Err(PredicateError::UnknownKind(other.to_string())),
        }
    }
}

/// Comparison applied by an order condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Smaller,
    /// `<=`
    SmallerOrEqual,
    /// Membership.
    In,
    /// Non-membership.
    NotIn,
}

impl Operator {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::Greater => "greater",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::Smaller => "smaller",
            Operator::SmallerOrEqual => "smaller_or_equal",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Operator::Equal),
            "not_equal" => Ok(Operator::NotEqual),
            "greater" => Ok(Operator::Greater),
            "greater_or_equal" => Ok(Operator::GreaterOrEqual),
            "smaller" => Ok(Operator::Smaller),
            "smaller_or_equal" => Ok(Operator::SmallerOrEqual),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            other => Err(PredicateError::UnknownOperator(other.to_string())),
        }
    }
}

/// Errors decoding a stored condition row into a [`Predicate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    /// Unrecognised condition type.
    #[error("unknown condition type: {0}")]
    UnknownKind(String),

    /// Unrecognised operator.
    #[error("unknown condition operator: {0}")]
    UnknownOperator(String),

    /// The operator cannot be used with this condition type.
    #[error("operator {operator} cannot be used with {kind} conditions")]
    UnsupportedOperator {
        /// Condition type.
        kind: ConditionKind,
        /// Operator supplied.
        operator: Operator,
    },

    /// Price conditions need a decimal value.
    #[error("price conditions require a decimal value")]
    MissingValue,

    /// Price values must be non-negative with at most two decimal places.
    #[error("invalid price condition value: {0}")]
    InvalidValue(Decimal),

    /// Attribute conditions need at least one id.
    #[error("{0} conditions require at least one id")]
    MissingIds(ConditionKind),
}

/// The generic row shape of an order condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateParts {
    /// Condition type.
    pub kind: ConditionKind,

    /// Operator.
    pub operator: Operator,

    /// Decimal operand for price conditions.
    pub value_decimal: Option<Decimal>,

    /// Id operands for attribute conditions.
    pub value_ids: Vec<String>,
}

/// A decoded order condition predicate, evaluated against a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Unit price equals the value.
    PriceEqual(Decimal),
    /// Unit price differs from the value.
    PriceNotEqual(Decimal),
    /// Unit price is above the value.
    PriceGreater(Decimal),
    /// Unit price is at or above the value.
    PriceGreaterOrEqual(Decimal),
    /// Unit price is below the value.
    PriceSmaller(Decimal),
    /// Unit price is at or below the value.
    PriceSmallerOrEqual(Decimal),
    /// Product is one of the ids.
    ProductIn(IdSet),
    /// Product is none of the ids.
    ProductNotIn(IdSet),
    /// Variant id or SKU is one of the ids.
    VariantIn(IdSet),
    /// Variant id or SKU is none of the ids.
    VariantNotIn(IdSet),
    /// Product belongs to one of the collections.
    CollectionIn(IdSet),
    /// Product belongs to none of the collections.
    CollectionNotIn(IdSet),
    /// Product belongs to one of the categories.
    CategoryIn(IdSet),
    /// Product belongs to none of the categories.
    CategoryNotIn(IdSet),
}

impl Predicate {
    /// Whether the predicate holds for the line.
    pub fn evaluate(&self, line: &LineItem) -> bool {
        let price = line.unit_price();

        match self {
            Predicate::PriceEqual(value) => price == *value,
            Predicate::PriceNotEqual(value) => price != *value,
            Predicate::PriceGreater(value) => price > *value,
            Predicate::PriceGreaterOrEqual(value) => price >= *value,
            Predicate::PriceSmaller(value) => price < *value,
            Predicate::PriceSmallerOrEqual(value) => price <= *value,
            Predicate::ProductIn(ids) => line.is_identified_by(EntityKind::Product, ids),
            Predicate::ProductNotIn(ids) => !line.is_identified_by(EntityKind::Product, ids),
            Predicate::VariantIn(ids) => line.is_identified_by(EntityKind::Variant, ids),
            Predicate::VariantNotIn(ids) => !line.is_identified_by(EntityKind::Variant, ids),
            Predicate::CollectionIn(ids) => line.is_identified_by(EntityKind::Collection, ids),
            Predicate::CollectionNotIn(ids) => {
                !line.is_identified_by(EntityKind::Collection, ids)
            }
            Predicate::CategoryIn(ids) => line.is_identified_by(EntityKind::Category, ids),
            Predicate::CategoryNotIn(ids) => !line.is_identified_by(EntityKind::Category, ids),
        }
    }

    /// Encode back into the generic row shape.
    pub fn to_parts(&self) -> PredicateParts {
        let (kind, operator, value_decimal, ids) = match self {
            Predicate::PriceEqual(v) => (ConditionKind::Price, Operator::Equal, Some(*v), None),
            Predicate::PriceNotEqual(v) => {
                (ConditionKind::Price, Operator::NotEqual, Some(*v), None)
            }
            Predicate::PriceGreater(v) => (ConditionKind::Price, Operator::Greater, Some(*v), None),
            Predicate::PriceGreaterOrEqual(v) => {
                (ConditionKind::Price, Operator::GreaterOrEqual, Some(*v), None)
            }
            Predicate::PriceSmaller(v) => (ConditionKind::Price, Operator::Smaller, Some(*v), None),
            Predicate::PriceSmallerOrEqual(v) => {
                (ConditionKind::Price, Operator::SmallerOrEqual, Some(*v), None)
            }
            Predicate::ProductIn(ids) => (ConditionKind::Product, Operator::In, None, Some(ids)),
            Predicate::ProductNotIn(ids) => {
                (ConditionKind::Product, Operator::NotIn, None, Some(ids))
            }
            Predicate::VariantIn(ids) => (ConditionKind::Variant, Operator::In, None, Some(ids)),
            Predicate::VariantNotIn(ids) => {
                (ConditionKind::Variant, Operator::NotIn, None, Some(ids))
            }
            Predicate::CollectionIn(ids) => {
                (ConditionKind::Collection, Operator::In, None, Some(ids))
            }
            Predicate::CollectionNotIn(ids) => {
                (ConditionKind::Collection, Operator::NotIn, None, Some(ids))
            }
            Predicate::CategoryIn(ids) => (ConditionKind::Category, Operator::In, None, Some(ids)),
            Predicate::CategoryNotIn(ids) => {
                (ConditionKind::Category, Operator::NotIn, None, Some(ids))
            }
        };

        PredicateParts {
            kind,
            operator,
            value_decimal,
            value_ids: ids.map(IdSet::to_vec).unwrap_or_default(),
        }
    }
}

impl TryFrom<PredicateParts> for Predicate {
    type Error = PredicateError;

    fn try_from(parts: PredicateParts) -> Result<Self, Self::Error> {
        let PredicateParts {
            kind,
            operator,
            value_decimal,
            value_ids,
        } = parts;

        if kind == ConditionKind::Price {
            let value = value_decimal.ok_or(PredicateError::MissingValue)?;

            if value.is_sign_negative() || !has_minor_unit_precision(value) {
                return Err(PredicateError::InvalidValue(value));
            }

            return match operator {
                Operator::Equal => Ok(Predicate::PriceEqual(value)),
                Operator::NotEqual => Ok(Predicate::PriceNotEqual(value)),
                Operator::Greater => Ok(Predicate::PriceGreater(value)),
                Operator::GreaterOrEqual => Ok(Predicate::PriceGreaterOrEqual(value)),
                Operator::Smaller => Ok(Predicate::PriceSmaller(value)),
                Operator::SmallerOrEqual => Ok(Predicate::PriceSmallerOrEqual(value)),
                Operator::In | Operator::NotIn => {
                    Err(PredicateError::UnsupportedOperator { kind, operator })
                }
            };
        }

        let ids = IdSet::new(value_ids.into_iter().filter(|id| !id.is_empty()));

        if ids.is_empty() {
            return Err(PredicateError::MissingIds(kind));
        }

        match (kind, operator) {
            (ConditionKind::Product, Operator::In) => Ok(Predicate::ProductIn(ids)),
            (ConditionKind::Product, Operator::NotIn) => Ok(Predicate::ProductNotIn(ids)),
            (ConditionKind::Variant, Operator::In) => Ok(Predicate::VariantIn(ids)),
            (ConditionKind::Variant, Operator::NotIn) => Ok(Predicate::VariantNotIn(ids)),
            (ConditionKind::Collection, Operator::In) => Ok(Predicate::CollectionIn(ids)),
            (ConditionKind::Collection, Operator::NotIn) => Ok(Predicate::CollectionNotIn(ids)),
            (ConditionKind::Category, Operator::In) => Ok(Predicate::CategoryIn(ids)),
            (ConditionKind::Category, Operator::NotIn) => Ok(Predicate::CategoryNotIn(ids)),
            _ => Err(PredicateError::UnsupportedOperator { kind, operator }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn price_parts(operator: Operator, value: Decimal) -> PredicateParts {
        PredicateParts {
            kind: ConditionKind::Price,
            operator,
            value_decimal: Some(value),
            value_ids: Vec::new(),
        }
    }

    fn id_parts(kind: ConditionKind, operator: Operator, ids: &[&str]) -> PredicateParts {
        PredicateParts {
            kind,
            operator,
            value_decimal: None,
            value_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn price_predicates_compare_unit_price() -> TestResult {
        let line = LineItem::new("v", "p", dec!(10.00)).with_quantity(4);

        let cases = [
            (Operator::Equal, dec!(10), true),
            (Operator::NotEqual, dec!(10), false),
            (Operator::Greater, dec!(10), false),
            (Operator::GreaterOrEqual, dec!(10), true),
            (Operator::Smaller, dec!(10.01), true),
            (Operator::SmallerOrEqual, dec!(9.99), false),
        ];

        for (operator, value, expected) in cases {
            let predicate = Predicate::try_from(price_parts(operator, value))?;

            assert_eq!(predicate.evaluate(&line), expected, "{operator} {value}");
        }

        Ok(())
    }

    #[test]
    fn attribute_predicates_check_membership() -> TestResult {
        let line = LineItem::new("v1", "p1", dec!(5))
            .with_collections(["summer".to_string()])
            .with_categories(["tops".to_string()]);

        let collection_in =
            Predicate::try_from(id_parts(ConditionKind::Collection, Operator::In, &["summer"]))?;
        let category_not_in =
            Predicate::try_from(id_parts(ConditionKind::Category, Operator::NotIn, &["tops"]))?;
        let product_not_in =
            Predicate::try_from(id_parts(ConditionKind::Product, Operator::NotIn, &["p2"]))?;

        assert!(collection_in.evaluate(&line));
        assert!(!category_not_in.evaluate(&line));
        assert!(product_not_in.evaluate(&line));

        Ok(())
    }

    #[test]
    fn decoding_rejects_mismatched_pairings() {
        assert_eq!(
            Predicate::try_from(price_parts(Operator::In, dec!(1))),
            Err(PredicateError::UnsupportedOperator {
                kind: ConditionKind::Price,
                operator: Operator::In,
            })
        );

        assert_eq!(
            Predicate::try_from(id_parts(ConditionKind::Product, Operator::Greater, &["p"])),
            Err(PredicateError::UnsupportedOperator {
                kind: ConditionKind::Product,
                operator: Operator::Greater,
            })
        );

        assert_eq!(
            Predicate::try_from(id_parts(ConditionKind::Variant, Operator::In, &[""])),
            Err(PredicateError::MissingIds(ConditionKind::Variant))
        );

        assert_eq!(
            Predicate::try_from(PredicateParts {
                value_decimal: None,
                ..price_parts(Operator::Equal, dec!(0))
            }),
            Err(PredicateError::MissingValue)
        );

        assert_eq!(
            Predicate::try_from(price_parts(Operator::Equal, dec!(1.001))),
            Err(PredicateError::InvalidValue(dec!(1.001)))
        );
    }

    #[test]
    fn to_parts_restores_the_row_shape() -> TestResult {
        let parts = id_parts(ConditionKind::Category, Operator::In, &["b", "a"]);
        let predicate = Predicate::try_from(parts)?;

        let restored = predicate.to_parts();

        assert_eq!(restored.kind, ConditionKind::Category);
        assert_eq!(restored.operator, Operator::In);
        assert_eq!(restored.value_ids, ["a", "b"]);

        Ok(())
    }

    #[test]
    fn stored_strings_parse() -> TestResult {
        assert_eq!("greater_or_equal".parse::<Operator>()?, Operator::GreaterOrEqual);
        assert_eq!("collection".parse::<ConditionKind>()?, ConditionKind::Collection);
        assert_eq!(
            "between".parse::<Operator>(),
            Err(PredicateError::UnknownOperator("between".to_string()))
        );

        Ok(())
    }
}
