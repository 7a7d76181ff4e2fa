//! Buy X Get Y
//!
//! A cart-level discount: once the cart carries enough qualifying "buy" units,
//! up to `get.quantity` "get" units are discounted by `get.discount_percent`.
//! Granted units are chosen cheapest first, and a unit is never granted if the
//! buy requirement would stop being met without it.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    cart::Cart,
    coupons::Coupon,
    discounts::Discount,
    idset::IdSet,
    items::{EntityKind, LineItem},
    pricing::{Percent, has_minor_unit_precision, round_price},
};

/// Errors constructing [`BuyXGetY`] terms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuyXGetYError {
    /// The buy requirement must be greater than zero.
    #[error("buy requirement must be greater than zero")]
    ZeroMinimum,

    /// Minimum amounts share the currency's minor-unit precision.
    #[error("buy minimum amount may have at most two decimal places, got {0}")]
    AmountPrecision(Decimal),

    /// At least one unit must be granted.
    #[error("get quantity must be greater than zero")]
    ZeroGetQuantity,

    /// The buy group must name at least one entity.
    #[error("buy group must list at least one id")]
    EmptyBuyIds,

    /// The get group must name at least one entity.
    #[error("get group must list at least one id")]
    EmptyGetIds,
}

/// The buy requirement: a unit count or a spend amount on qualifying units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minimum {
    /// At least this many qualifying units.
    Quantity(u32),

    /// At least this much spent on qualifying units.
    Amount(Decimal),
}

impl Minimum {
    fn threshold(self) -> Decimal {
        match self {
            Minimum::Quantity(quantity) => Decimal::from(quantity),
            Minimum::Amount(amount) => amount,
        }
    }

    /// How much one unit at `price` contributes towards the requirement.
    fn weight(self, price: Decimal) -> Decimal {
        match self {
            Minimum::Quantity(_) => Decimal::ONE,
            Minimum::Amount(_) => price,
        }
    }
}

/// The units that qualify the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyGroup {
    /// Requirement to meet.
    pub requirement: Minimum,

    /// Kind of entity `ids` refers to.
    pub entity: EntityKind,

    /// Qualifying entities.
    pub ids: IdSet,
}

/// The units granted at a discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetGroup {
    /// Maximum units granted.
    pub quantity: u32,

    /// Discount on each granted unit.
    pub discount_percent: Percent,

    /// Kind of entity `ids` refers to.
    pub entity: EntityKind,

    /// Grantable entities.
    pub ids: IdSet,
}

/// Validated buy-x-get-y terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyXGetY {
    buy: BuyGroup,
    get: GetGroup,
}

impl BuyXGetY {
    /// Validate the groups.
    ///
    /// # Errors
    ///
    /// Returns [`BuyXGetYError`] if either group is empty or zero-sized.
    pub fn new(buy: BuyGroup, get: GetGroup) -> Result<Self, BuyXGetYError> {
        match buy.requirement {
            Minimum::Quantity(0) => return Err(BuyXGetYError::ZeroMinimum),
            Minimum::Amount(amount) if amount <= Decimal::ZERO => {
                return Err(BuyXGetYError::ZeroMinimum);
            }
            Minimum::Amount(amount) if !has_minor_unit_precision(amount) => {
                return Err(BuyXGetYError::AmountPrecision(amount));
            }
            Minimum::Quantity(_) | Minimum::Amount(_) => {}
        }

        if buy.ids.is_empty() {
            return Err(BuyXGetYError::EmptyBuyIds);
        }

        if get.quantity == 0 {
            return Err(BuyXGetYError::ZeroGetQuantity);
        }

        if get.ids.is_empty() {
            return Err(BuyXGetYError::EmptyGetIds);
        }

        Ok(Self { buy, get })
    }

    /// The buy group.
    pub fn buy(&self) -> &BuyGroup {
        &self.buy
    }

    /// The get group.
    pub fn get(&self) -> &GetGroup {
        &self.get
    }

    /// Apply the terms to a cart.
    pub fn apply(&self, cart: &Cart) -> AdjustedCart {
        let requirement = self.buy.requirement;
        let minimum = requirement.threshold();

        let mut qualifying = Decimal::ZERO;
        let mut candidates: Vec<Candidate> = Vec::new();

        for (index, line) in cart.lines().iter().enumerate() {
            let buys = line.is_identified_by(self.buy.entity, &self.buy.ids);
            let gets = line.is_identified_by(self.get.entity, &self.get.ids);

            if buys {
                qualifying += requirement.weight(line.unit_price()) * Decimal::from(line.quantity());
            }

            if gets {
                // No line can contribute more than the whole grant.
                let units = line.quantity().min(self.get.quantity);

                candidates.extend((0..units).map(|_| Candidate {
                    index,
                    price: line.unit_price(),
                    buys,
                }));
            }
        }

        if qualifying < minimum {
            return AdjustedCart::unadjusted(cart);
        }

        candidates.sort_by_key(|candidate| candidate.price);

        let mut granted = vec![0_u32; cart.lines().len()];
        let mut remaining = self.get.quantity;

        for candidate in candidates {
            if remaining == 0 {
                break;
            }

            if candidate.buys {
                let weight = requirement.weight(candidate.price);

                if qualifying - weight < minimum {
                    continue;
                }

                qualifying -= weight;
            }

            if let Some(count) = granted.get_mut(candidate.index) {
                *count += 1;
                remaining -= 1;
            }
        }

        let fraction = self.get.discount_percent.fraction();

        let lines = cart
            .lines()
            .iter()
            .zip(granted)
            .map(|(line, granted_units)| AdjustedLine {
                discount: line.unit_price() * fraction * Decimal::from(granted_units),
                line: line.clone(),
                granted_units,
            })
            .collect();

        AdjustedCart { lines }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    price: Decimal,
    buys: bool,
}

/// A cart line after a cart-level discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedLine {
    line: LineItem,
    granted_units: u32,
    discount: Decimal,
}

impl AdjustedLine {
    /// The original line.
    pub fn line(&self) -> &LineItem {
        &self.line
    }

    /// Units of this line granted at a discount.
    pub const fn granted_units(&self) -> u32 {
        self.granted_units
    }

    /// Discount taken off the line, rounded.
    pub fn discount(&self) -> Decimal {
        round_price(self.discount)
    }

    /// Line total before the discount, rounded.
    pub fn original_total(&self) -> Decimal {
        round_price(self.line.line_total())
    }

    /// Line total after the discount, rounded.
    pub fn total(&self) -> Decimal {
        round_price(self.line.line_total() - self.discount)
    }
}

/// A cart with buy-x-get-y adjustments applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedCart {
    lines: Vec<AdjustedLine>,
}

impl AdjustedCart {
    /// The cart with no units granted.
    pub fn unadjusted(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| AdjustedLine {
                    line: line.clone(),
                    granted_units: 0,
                    discount: Decimal::ZERO,
                })
                .collect(),
        }
    }

    /// Adjusted lines, in cart order.
    pub fn lines(&self) -> &[AdjustedLine] {
        &self.lines
    }

    /// Whether any unit was granted.
    pub fn is_adjusted(&self) -> bool {
        self.granted_units() > 0
    }

    /// Units granted across the cart.
    pub fn granted_units(&self) -> u32 {
        self.lines.iter().map(AdjustedLine::granted_units).sum()
    }

    /// Cart total before the discount, rounded.
    pub fn subtotal(&self) -> Decimal {
        round_price(self.lines.iter().map(|line| line.line.line_total()).sum())
    }

    /// Total discount, rounded.
    pub fn discount_total(&self) -> Decimal {
        round_price(self.lines.iter().map(|line| line.discount).sum())
    }

    /// Cart total after the discount, rounded.
    pub fn total(&self) -> Decimal {
        round_price(
            self.lines
                .iter()
                .map(|line| line.line.line_total() - line.discount)
                .sum(),
        )
    }
}

/// Apply a coupon's buy-x-get-y terms to a cart.
///
/// Coupons with per-unit discounts leave the cart unadjusted.
pub fn apply_buy_x_get_y(cart: &Cart, coupon: &Coupon) -> AdjustedCart {
    match &coupon.discount {
        Discount::BuyXGetY(terms) => terms.apply(cart),
        Discount::Fixed(_) | Discount::Percentage(_) => AdjustedCart::unadjusted(cart),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn terms(requirement: Minimum, get_quantity: u32, percent: Decimal) -> TestResult<BuyXGetY> {
        Ok(BuyXGetY::new(
            BuyGroup {
                requirement,
                entity: EntityKind::Product,
                ids: IdSet::from_strs(&["tee"]),
            },
            GetGroup {
                quantity: get_quantity,
                discount_percent: Percent::new(percent)?,
                entity: EntityKind::Collection,
                ids: IdSet::from_strs(&["summer"]),
            },
        )?)
    }

    fn tee(variant: &str, price: Decimal, quantity: u32) -> LineItem {
        LineItem::new(variant, "tee", price)
            .with_quantity(quantity)
            .with_collections(["summer".to_string()])
    }

    fn cap(price: Decimal) -> LineItem {
        LineItem::new("cap", "cap", price).with_collections(["summer".to_string()])
    }

    #[test]
    fn below_minimum_leaves_cart_unadjusted() -> TestResult {
        let cart = Cart::new([tee("tee-s", dec!(10), 1), cap(dec!(5))]);
        let adjusted = terms(Minimum::Quantity(2), 1, dec!(100))?.apply(&cart);

        assert!(!adjusted.is_adjusted());
        assert_eq!(adjusted.total(), dec!(15.00));

        Ok(())
    }

    #[test]
    fn cheapest_get_unit_is_granted() -> TestResult {
        let cart = Cart::new([tee("tee-s", dec!(10), 2), cap(dec!(5)), cap(dec!(4))]);
        let adjusted = terms(Minimum::Quantity(2), 1, dec!(50))?.apply(&cart);

        assert_eq!(adjusted.granted_units(), 1);
        assert_eq!(adjusted.discount_total(), dec!(2.00));
        assert_eq!(adjusted.subtotal(), dec!(29.00));
        assert_eq!(adjusted.total(), dec!(27.00));

        let granted: Vec<u32> = adjusted
            .lines()
            .iter()
            .map(AdjustedLine::granted_units)
            .collect();

        assert_eq!(granted, [0, 0, 1]);

        Ok(())
    }

    #[test]
    fn units_needed_to_qualify_are_not_granted() -> TestResult {
        // Two tees exactly meet "buy 2"; neither may also be the free unit.
        let two = Cart::new([tee("tee-s", dec!(10), 2)]);
        let adjusted = terms(Minimum::Quantity(2), 1, dec!(100))?.apply(&two);

        assert!(!adjusted.is_adjusted());

        // A third tee can be granted.
        let three = Cart::new([tee("tee-s", dec!(10), 3)]);
        let adjusted = terms(Minimum::Quantity(2), 1, dec!(100))?.apply(&three);

        assert_eq!(adjusted.granted_units(), 1);
        assert_eq!(adjusted.total(), dec!(20.00));

        Ok(())
    }

    #[test]
    fn amount_requirement_counts_spend() -> TestResult {
        let cart = Cart::new([tee("tee-s", dec!(15), 1), tee("tee-m", dec!(20), 1), cap(dec!(8))]);
        let adjusted = terms(Minimum::Amount(dec!(30)), 2, dec!(100))?.apply(&cart);

        // The cap is granted; the 15.00 tee would drop spend to 20.00.
        assert_eq!(adjusted.granted_units(), 1);
        assert_eq!(adjusted.discount_total(), dec!(8.00));

        Ok(())
    }

    #[test]
    fn grant_is_capped_at_get_quantity() -> TestResult {
        let cart = Cart::new([tee("tee-s", dec!(10), 2), cap(dec!(3)), cap(dec!(3)), cap(dec!(3))]);
        let adjusted = terms(Minimum::Quantity(1), 2, dec!(100))?.apply(&cart);

        assert_eq!(adjusted.granted_units(), 2);
        assert_eq!(adjusted.discount_total(), dec!(6.00));

        Ok(())
    }

    #[test]
    fn totals_round_half_up() -> TestResult {
        let cart = Cart::new([tee("tee-s", dec!(10), 1), cap(dec!(0.25))]);
        let adjusted = terms(Minimum::Quantity(1), 1, dec!(10))?.apply(&cart);

        assert_eq!(adjusted.discount_total(), dec!(0.03));
        assert_eq!(adjusted.total(), dec!(10.23));

        Ok(())
    }

    #[test]
    fn construction_rejects_empty_groups() -> TestResult {
        let percent = Percent::new(dec!(100))?;
        let buy = BuyGroup {
            requirement: Minimum::Quantity(0),
            entity: EntityKind::Variant,
            ids: IdSet::from_strs(&["v"]),
        };
        let get = GetGroup {
            quantity: 1,
            discount_percent: percent,
            entity: EntityKind::Variant,
            ids: IdSet::from_strs(&["v"]),
        };

        assert_eq!(
            BuyXGetY::new(buy.clone(), get.clone()),
            Err(BuyXGetYError::ZeroMinimum)
        );

        let buy = BuyGroup {
            requirement: Minimum::Quantity(1),
            ..buy
        };

        assert_eq!(
            BuyXGetY::new(buy.clone(), GetGroup { quantity: 0, ..get.clone() }),
            Err(BuyXGetYError::ZeroGetQuantity)
        );
        assert_eq!(
            BuyXGetY::new(
                buy,
                GetGroup {
                    ids: IdSet::default(),
                    ..get
                }
            ),
            Err(BuyXGetYError::EmptyGetIds)
        );

        Ok(())
    }
}
