//! Storefront Service

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use redeem::{
    cart::Cart,
    conditions::CustomerGroup,
    coupons::Coupon,
    discounts::{apply_buy_x_get_y, calculate_discounted_price},
    eligibility::{Customer, applicable_coupons, evaluate_for_cart},
    items::LineItem,
    pricing::round_price,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{Span, debug, info};

use crate::domain::{
    coupons::{CouponsServiceError, service::CouponsService},
    customers::{CustomerSpendError, CustomerSpendLookup},
    storefront::{
        CartDiscount, CouponRef, LineQuote, Quote, QuoteCustomer, QuoteLine, QuoteRequest,
    },
};

#[derive(Debug, Error)]
pub enum StorefrontServiceError {
    #[error("failed to load coupons")]
    Coupons(#[from] CouponsServiceError),

    #[error("failed to load customer spend")]
    Spend(#[from] CustomerSpendError),
}

#[automock]
#[async_trait]
pub trait StorefrontService: Send + Sync {
    /// Price every line of a cart, then apply any cart-level coupon.
    async fn quote(&self, request: QuoteRequest) -> Result<Quote, StorefrontServiceError>;
}

#[derive(Clone)]
pub struct StorefrontManager {
    coupons: Arc<dyn CouponsService>,
    spend: Arc<dyn CustomerSpendLookup>,
}

impl StorefrontManager {
    #[must_use]
    pub fn new(coupons: Arc<dyn CouponsService>, spend: Arc<dyn CustomerSpendLookup>) -> Self {
        Self { coupons, spend }
    }

    /// Build the evaluator's customer, reading spend only when `needs_spend`.
    async fn customer(
        &self,
        customer: Option<QuoteCustomer>,
        needs_spend: bool,
    ) -> Result<Option<Customer>, StorefrontServiceError> {
        let Some(QuoteCustomer { email, groups }) = customer else {
            return Ok(None);
        };

        let purchased_total = match (&email, needs_spend) {
            (Some(email), true) => self.spend.purchased_total(email).await?,
            _ => None,
        };

        Ok(Some(Customer {
            email,
            groups: groups.into_iter().map(CustomerGroup::new).collect(),
            purchased_total,
        }))
    }
}

#[async_trait]
impl StorefrontService for StorefrontManager {
    #[tracing::instrument(
        name = "storefront.service.quote",
        skip(self, request),
        fields(
            line_count = request.lines.len(),
            offered_count = tracing::field::Empty,
            cart_coupon = tracing::field::Empty
        ),
        err
    )]
    async fn quote(&self, request: QuoteRequest) -> Result<Quote, StorefrontServiceError> {
        let QuoteRequest {
            customer,
            entered_codes,
            lines,
            now,
        } = request;

        let (cart_level, per_unit): (Vec<Coupon>, Vec<Coupon>) = self
            .coupons
            .active_coupons(now)
            .await?
            .into_iter()
            .filter(|coupon| coupon.is_offered(&entered_codes))
            .partition(Coupon::is_cart_level);

        let span = Span::current();

        span.record("offered_count", per_unit.len() + cart_level.len());

        let needs_spend = per_unit.iter().chain(&cart_level).any(|coupon| {
            coupon
                .customer
                .as_ref()
                .is_some_and(|conditions| conditions.min_purchased_amount.is_some())
        });

        let customer = self.customer(customer, needs_spend).await?;

        let line_quotes: Vec<LineQuote> = lines
            .into_iter()
            .map(|line| price_line(line, &per_unit, customer.as_ref(), now))
            .collect();

        let subtotal = round_price(line_quotes.iter().map(|quote| quote.item.line_total()).sum());

        let cart: Cart = line_quotes.iter().map(LineQuote::discounted_item).collect();

        let cart_discount = cart_level
            .iter()
            .filter(|coupon| evaluate_for_cart(coupon, customer.as_ref(), now).is_applicable())
            .map(|coupon| CartDiscount {
                coupon: CouponRef::from(coupon),
                adjusted: apply_buy_x_get_y(&cart, coupon),
            })
            .find(|discount| discount.adjusted.is_adjusted());

        let total = match &cart_discount {
            Some(discount) => {
                span.record("cart_coupon", tracing::field::display(&discount.coupon.code));

                discount.adjusted.total()
            }
            None => round_price(cart.lines().iter().map(LineItem::line_total).sum()),
        };

        info!(%subtotal, %total, "quoted cart");

        Ok(Quote {
            lines: line_quotes,
            cart_discount,
            subtotal,
            total,
        })
    }
}

fn price_line(
    line: QuoteLine,
    coupons: &[Coupon],
    customer: Option<&Customer>,
    now: jiff::Timestamp,
) -> LineQuote {
    let QuoteLine {
        item,
        selected_coupon,
    } = line;

    let applicable = applicable_coupons(coupons, &item, customer, now);

    let applied = selected_coupon
        .and_then(|selected| applicable.iter().find(|coupon| coupon.id == selected))
        .or_else(|| applicable.first())
        .copied();

    let base = item.unit_price();
    let discounted = calculate_discounted_price(base, applied);

    debug!(
        variant_id = item.variant_id(),
        applicable = applicable.len(),
        applied = applied.map(|coupon| coupon.code.as_str()),
        "priced line"
    );

    LineQuote {
        applicable: applicable.iter().map(|coupon| CouponRef::from(*coupon)).collect(),
        applied: applied.map(CouponRef::from),
        unit_price: round_price(base),
        discounted_unit_price: round_price(discounted),
        line_total: round_price(discounted * Decimal::from(item.quantity())),
        exact_unit_price: discounted,
        item,
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, ToSpan};
    use redeem::{
        conditions::{CustomerConditions, OrderConditions, TargetVariants, UsageConditions},
        coupons::{CouponCode, CouponId, CouponType, ValidityWindow},
        discounts::{BuyGroup, BuyXGetY, Discount, GetGroup, Minimum},
        idset::IdSet,
        items::EntityKind,
        pricing::Percent,
    };
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;
    use crate::domain::{coupons::service::MockCouponsService, customers::MockCustomerSpendLookup};

    fn coupon(id: i64, code: &str, discount: Discount) -> TestResult<Coupon> {
        let now = Timestamp::now();

        Ok(Coupon {
            id: CouponId::new(id),
            code: CouponCode::parse(code)?,
            coupon_type: CouponType::Automatic,
            description: None,
            status: true,
            discount,
            validity: ValidityWindow::new(now - 1.hour(), now + 24.hours())?,
            usage: UsageConditions::default(),
            targets: TargetVariants::any(),
            customer: None,
            order_conditions: OrderConditions::default(),
            created_at: now,
        })
    }

    fn manager(coupons: Vec<Coupon>, spend: MockCustomerSpendLookup) -> StorefrontManager {
        let mut service = MockCouponsService::new();

        service
            .expect_active_coupons()
            .times(1)
            .returning(move |_| Ok(coupons.clone()));

        StorefrontManager::new(Arc::new(service), Arc::new(spend))
    }

    fn request(lines: Vec<QuoteLine>) -> QuoteRequest {
        QuoteRequest {
            customer: None,
            entered_codes: Vec::new(),
            lines,
            now: Timestamp::now(),
        }
    }

    fn line(variant: &str, price: rust_decimal::Decimal) -> QuoteLine {
        QuoteLine {
            item: LineItem::new(variant, "p1", price),
            selected_coupon: None,
        }
    }

    #[tokio::test]
    async fn percentage_coupon_discounts_the_line() -> TestResult {
        let coupons = vec![coupon(1, "SPRING20", Discount::percentage(dec!(20))?)?];
        let service = manager(coupons, MockCustomerSpendLookup::new());

        let quote = service
            .quote(request(vec![line("VAR-1", dec!(1000.00))]))
            .await?;

        let priced = quote.lines.first().ok_or("expected one line")?;

        assert_eq!(priced.discounted_unit_price, dec!(800.00));
        assert_eq!(quote.subtotal, dec!(1000.00));
        assert_eq!(quote.total, dec!(800.00));

        Ok(())
    }

    #[tokio::test]
    async fn fixed_coupon_floors_at_zero() -> TestResult {
        let coupons = vec![coupon(1, "FLAT150", Discount::fixed(dec!(150))?)?];
        let service = manager(coupons, MockCustomerSpendLookup::new());

        let quote = service
            .quote(request(vec![line("VAR-1", dec!(100.00))]))
            .await?;

        assert_eq!(quote.total, dec!(0.00));

        Ok(())
    }

    #[tokio::test]
    async fn selected_coupon_wins_when_it_applies() -> TestResult {
        let coupons = vec![
            coupon(1, "TEN", Discount::percentage(dec!(10))?)?,
            coupon(2, "TWENTY", Discount::percentage(dec!(20))?)?,
        ];
        let service = manager(coupons, MockCustomerSpendLookup::new());

        let mut selected = line("VAR-1", dec!(50));

        selected.selected_coupon = Some(CouponId::new(2));

        let mut stale = line("VAR-2", dec!(50));

        stale.selected_coupon = Some(CouponId::new(99));

        let quote = service.quote(request(vec![selected, stale])).await?;

        let applied: Vec<_> = quote
            .lines
            .iter()
            .map(|line| line.applied.as_ref().map(|coupon| coupon.id))
            .collect();

        assert_eq!(applied, [Some(CouponId::new(2)), Some(CouponId::new(1))]);

        Ok(())
    }

    #[tokio::test]
    async fn manual_coupons_need_an_entered_code() -> TestResult {
        let manual = Coupon {
            coupon_type: CouponType::Manual,
            ..coupon(1, "SECRET", Discount::percentage(dec!(50))?)?
        };

        let without = manager(vec![manual.clone()], MockCustomerSpendLookup::new())
            .quote(request(vec![line("VAR-1", dec!(10))]))
            .await?;

        let with = manager(vec![manual], MockCustomerSpendLookup::new())
            .quote(QuoteRequest {
                entered_codes: vec!["SECRET".into()],
                ..request(vec![line("VAR-1", dec!(10))])
            })
            .await?;

        assert_eq!(without.total, dec!(10.00));
        assert_eq!(with.total, dec!(5.00));

        Ok(())
    }

    #[tokio::test]
    async fn spend_is_read_once_for_the_whole_cart() -> TestResult {
        let loyal = Coupon {
            customer: Some(CustomerConditions {
                group: Some(CustomerGroup::everyone()),
                min_purchased_amount: Some(dec!(100)),
                emails: IdSet::default(),
            }),
            ..coupon(1, "LOYAL", Discount::percentage(dec!(10))?)?
        };

        let mut spend = MockCustomerSpendLookup::new();

        spend
            .expect_purchased_total()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(|_| Ok(Some(dec!(150))));

        let quote = manager(vec![loyal], spend)
            .quote(QuoteRequest {
                customer: Some(QuoteCustomer {
                    email: Some("a@x.com".into()),
                    groups: Vec::new(),
                }),
                ..request(vec![line("VAR-1", dec!(10)), line("VAR-2", dec!(20))])
            })
            .await?;

        assert!(quote.lines.iter().all(|line| line.applied.is_some()));
        assert_eq!(quote.total, dec!(27.00));

        Ok(())
    }

    #[tokio::test]
    async fn guests_fail_spend_restrictions_without_a_lookup() -> TestResult {
        let loyal = Coupon {
            customer: Some(CustomerConditions {
                group: None,
                min_purchased_amount: Some(dec!(1)),
                emails: IdSet::default(),
            }),
            ..coupon(1, "LOYAL", Discount::percentage(dec!(10))?)?
        };

        let mut spend = MockCustomerSpendLookup::new();

        spend.expect_purchased_total().never();

        let quote = manager(vec![loyal], spend)
            .quote(request(vec![line("VAR-1", dec!(10))]))
            .await?;

        assert!(quote.lines.iter().all(|line| line.applicable.is_empty()));

        Ok(())
    }

    #[tokio::test]
    async fn buy_x_get_y_discounts_the_cart() -> TestResult {
        let terms = BuyXGetY::new(
            BuyGroup {
                requirement: Minimum::Quantity(2),
                entity: EntityKind::Product,
                ids: IdSet::from_strs(&["tee"]),
            },
            GetGroup {
                quantity: 1,
                discount_percent: Percent::new(dec!(100))?,
                entity: EntityKind::Product,
                ids: IdSet::from_strs(&["tee"]),
            },
        )?;

        let coupons = vec![coupon(1, "B2G1", Discount::BuyXGetY(terms))?];
        let service = manager(coupons, MockCustomerSpendLookup::new());

        let quote = service
            .quote(request(vec![QuoteLine {
                item: LineItem::new("tee-m", "tee", dec!(10)).with_quantity(3),
                selected_coupon: None,
            }]))
            .await?;

        let cart_discount = quote.cart_discount.ok_or("expected a cart discount")?;

        assert_eq!(cart_discount.coupon.code.as_str(), "B2G1");
        assert_eq!(cart_discount.adjusted.granted_units(), 1);
        assert_eq!(quote.subtotal, dec!(30.00));
        assert_eq!(quote.total, dec!(20.00));

        Ok(())
    }

    #[tokio::test]
    async fn cart_discount_is_priced_from_unrounded_line_prices() -> TestResult {
        let mugs = Coupon {
            targets: TargetVariants::new(["mug".to_string()]),
            ..coupon(1, "MUGS33", Discount::percentage(dec!(33))?)?
        };

        let terms = BuyXGetY::new(
            BuyGroup {
                requirement: Minimum::Quantity(1),
                entity: EntityKind::Product,
                ids: IdSet::from_strs(&["tee"]),
            },
            GetGroup {
                quantity: 1,
                discount_percent: Percent::new(dec!(100))?,
                entity: EntityKind::Product,
                ids: IdSet::from_strs(&["cap"]),
            },
        )?;

        let service = manager(
            vec![mugs, coupon(2, "TEECAP", Discount::BuyXGetY(terms))?],
            MockCustomerSpendLookup::new(),
        );

        let quote = service
            .quote(request(vec![
                QuoteLine {
                    item: LineItem::new("mug", "mug", dec!(0.99)).with_quantity(3),
                    selected_coupon: None,
                },
                QuoteLine {
                    item: LineItem::new("tee", "tee", dec!(10)),
                    selected_coupon: None,
                },
                QuoteLine {
                    item: LineItem::new("cap", "cap", dec!(5)),
                    selected_coupon: None,
                },
            ]))
            .await?;

        let mug = quote.lines.first().ok_or("expected the mug line")?;

        assert_eq!(mug.discounted_unit_price, dec!(0.66));
        assert_eq!(mug.exact_unit_price, dec!(0.6633));
        assert_eq!(mug.line_total, dec!(1.99));

        let cart_discount = quote.cart_discount.ok_or("expected a cart discount")?;
        let shown_lines: Decimal = quote.lines.iter().map(|line| line.line_total).sum();

        assert_eq!(cart_discount.adjusted.discount_total(), dec!(5.00));
        assert_eq!(shown_lines, dec!(16.99));
        assert_eq!(
            quote.total,
            shown_lines - cart_discount.adjusted.discount_total()
        );
        assert_eq!(quote.total, dec!(11.99));

        Ok(())
    }

    #[tokio::test]
    async fn coupon_load_failures_surface() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_active_coupons()
            .returning(|_| Err(CouponsServiceError::NotFound));

        let service = StorefrontManager::new(
            Arc::new(coupons),
            Arc::new(MockCustomerSpendLookup::new()),
        );

        let result = service.quote(request(Vec::new())).await;

        assert!(matches!(result, Err(StorefrontServiceError::Coupons(_))));
    }
}
