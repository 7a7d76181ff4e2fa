//! Target Variants

use crate::{idset::IdSet, items::LineItem};

/// The variants (by id or SKU) a coupon is restricted to. Empty means every variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetVariants(IdSet);

impl TargetVariants {
    /// Target the given variant ids or SKUs.
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self(IdSet::new(ids))
    }

    /// Untargeted.
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether the coupon is untargeted.
    pub fn is_wildcard(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the line's variant id or SKU is targeted.
    pub fn admits(&self, line: &LineItem) -> bool {
        if self.is_wildcard() {
            return true;
        }

        self.0.contains(line.variant_id()) || line.sku().is_some_and(|sku| self.0.contains(sku))
    }

    /// Targeted identifiers.
    pub fn ids(&self) -> &IdSet {
        &self.0
    }
}
