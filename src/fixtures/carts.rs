//! Cart Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, parse_decimal},
    items::LineItem,
};

/// Wrapper for carts in YAML
#[derive(Debug, Deserialize)]
pub struct CartsFixture {
    /// Map of cart key -> lines
    pub carts: FxHashMap<String, Vec<LineFixture>>,
}

/// Line Fixture
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Variant id
    pub variant: String,

    /// Product id
    pub product: String,

    /// SKU
    #[serde(default)]
    pub sku: Option<String>,

    /// Unit price (e.g., "12.50")
    pub price: String,

    /// Quantity (defaults to one)
    #[serde(default = "one")]
    pub quantity: u32,

    /// Collection ids
    #[serde(default)]
    pub collections: Vec<String>,

    /// Category ids
    #[serde(default)]
    pub categories: Vec<String>,
}

fn one() -> u32 {
    1
}

impl TryFrom<LineFixture> for LineItem {
    type Error = FixtureError;

    fn try_from(fixture: LineFixture) -> Result<Self, Self::Error> {
        let line = LineItem::new(fixture.variant, fixture.product, parse_decimal(&fixture.price)?)
            .with_quantity(fixture.quantity)
            .with_collections(fixture.collections)
            .with_categories(fixture.categories);

        Ok(match fixture.sku {
            Some(sku) => line.with_sku(sku),
            None => line,
        })
    }
}
