//! Order Conditions

use crate::{conditions::predicates::Predicate, items::LineItem};

/// A predicate plus the minimum quantity the line must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCondition {
    /// Predicate on the line.
    pub predicate: Predicate,

    /// Minimum line quantity.
    pub min_quantity: u32,
}

impl OrderCondition {
    /// Whether the condition holds for the line.
    pub fn holds(&self, line: &LineItem) -> bool {
        line.quantity() >= self.min_quantity && self.predicate.evaluate(line)
    }
}

/// All order conditions attached to a coupon. Every one must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderConditions(Vec<OrderCondition>);

impl OrderConditions {
    /// Wrap a list of conditions.
    pub fn new(conditions: impl IntoIterator<Item = OrderCondition>) -> Self {
        Self(conditions.into_iter().collect())
    }

    /// Whether no conditions are attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every condition holds for the line.
    pub fn all_hold(&self, line: &LineItem) -> bool {
        self.0.iter().all(|condition| condition.holds(line))
    }

    /// Iterate the conditions.
    pub fn iter(&self) -> std::slice::Iter<'_, OrderCondition> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::idset::IdSet;

    #[test]
    fn min_quantity_is_enforced() {
        let condition = OrderCondition {
            predicate: Predicate::PriceGreaterOrEqual(dec!(5)),
            min_quantity: 2,
        };

        let single = LineItem::new("v", "p", dec!(10));
        let pair = single.clone().with_quantity(2);

        assert!(!condition.holds(&single));
        assert!(condition.holds(&pair));
    }

    #[test]
    fn every_condition_must_hold() {
        let conditions = OrderConditions::new([
            OrderCondition {
                predicate: Predicate::PriceSmaller(dec!(20)),
                min_quantity: 0,
            },
            OrderCondition {
                predicate: Predicate::ProductIn(IdSet::from_strs(&["p1"])),
                min_quantity: 1,
            },
        ]);

        assert!(conditions.all_hold(&LineItem::new("v", "p1", dec!(10))));
        assert!(!conditions.all_hold(&LineItem::new("v", "p2", dec!(10))));
        assert!(OrderConditions::default().all_hold(&LineItem::new("v", "p2", dec!(10))));
    }
}
