//! Items

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::idset::IdSet;

/// The catalogue entity an identifier list refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Product ids.
    Product,

    /// Variant ids or SKUs.
    Variant,

    /// Collection ids.
    Collection,

    /// Category ids.
    Category,
}

impl EntityKind {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Variant => "variant",
            EntityKind::Collection => "collection",
            EntityKind::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity kind string that is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(EntityKind::Product),
            "variant" => Ok(EntityKind::Variant),
            "collection" => Ok(EntityKind::Collection),
            "category" => Ok(EntityKind::Category),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

/// A cart or product-page line: one variant at a quantity and unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    variant_id: String,
    sku: Option<String>,
    product_id: String,
    collections: SmallVec<[String; 3]>,
    categories: SmallVec<[String; 3]>,
    quantity: u32,
    unit_price: Decimal,
}

impl LineItem {
    /// A single unit of a variant.
    pub fn new(
        variant_id: impl Into<String>,
        product_id: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            sku: None,
            product_id: product_id.into(),
            collections: SmallVec::new(),
            categories: SmallVec::new(),
            quantity: 1,
            unit_price,
        }
    }

    /// Set the SKU.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Set the quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the collections the product belongs to.
    #[must_use]
    pub fn with_collections(mut self, collections: impl IntoIterator<Item = String>) -> Self {
        self.collections = collections.into_iter().collect();
        self
    }

    /// Set the categories the product belongs to.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = String>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Replace the unit price, keeping everything else.
    #[must_use]
    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// Variant id.
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// SKU, if known.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    /// Product id.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Collection ids.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(String::as_str)
    }

    /// Category ids.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Quantity on the line.
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price of one unit.
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Unrounded line total.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line is identified by any of `ids` under the given entity kind.
    ///
    /// Variants match on either the variant id or the SKU.
    pub fn is_identified_by(&self, kind: EntityKind, ids: &IdSet) -> bool {
        match kind {
            EntityKind::Product => ids.contains(&self.product_id),
            EntityKind::Variant => {
                ids.contains(&self.variant_id) || self.sku().is_some_and(|sku| ids.contains(sku))
            }
            EntityKind::Collection => ids.contains_any(self.collections()),
            EntityKind::Category => ids.contains_any(self.categories()),
        }
    }
}
