//! Customer Conditions

use std::fmt;

use rust_decimal::Decimal;

use crate::idset::IdSet;

/// A named customer tier, e.g. `vip` or `wholesale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerGroup(String);

impl CustomerGroup {
    /// The reserved tier that every customer belongs to, guests included.
    pub const EVERYONE: &'static str = "everyone";

    /// Wrap a tier name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The tier that matches every customer.
    pub fn everyone() -> Self {
        Self::new(Self::EVERYONE)
    }

    /// Whether this is the reserved `everyone` tier.
    pub fn is_everyone(&self) -> bool {
        self.0 == Self::EVERYONE
    }

    /// Tier name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Restrictions on who may use a coupon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerConditions {
    /// Tier the customer must belong to.
    pub group: Option<CustomerGroup>,

    /// Minimum historical spend.
    pub min_purchased_amount: Option<Decimal>,

    /// Explicit allow-list, matched exactly.
    pub emails: IdSet,
}

impl CustomerConditions {
    /// Whether the customer dimension imposes no restriction at all.
    pub fn is_unrestricted(&self) -> bool {
        self.group.is_none() && self.emails.is_empty() && self.min_purchased_amount.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_conditions_are_unrestricted() {
        assert!(CustomerConditions::default().is_unrestricted());
    }

    #[test]
    fn any_field_restricts() {
        let with_spend = CustomerConditions {
            min_purchased_amount: Some(dec!(50)),
            ..CustomerConditions::default()
        };

        let with_email = CustomerConditions {
            emails: IdSet::from_strs(&["a@x.com"]),
            ..CustomerConditions::default()
        };

        assert!(!with_spend.is_unrestricted());
        assert!(!with_email.is_unrestricted());
    }

    #[test]
    fn everyone_is_reserved() {
        assert!(CustomerGroup::everyone().is_everyone());
        assert!(!CustomerGroup::new("vip").is_everyone());
    }
}
