//! Cart

use rust_decimal::Decimal;

use crate::items::LineItem;

/// The lines a customer is about to buy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// Create a cart from its lines.
    pub fn new(lines: impl IntoIterator<Item = LineItem>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
        }
    }

    /// Cart lines in order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Unrounded sum of line totals.
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(LineItem::line_total).sum()
    }
}

impl FromIterator<LineItem> for Cart {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        Self::new(iter)
    }
}
