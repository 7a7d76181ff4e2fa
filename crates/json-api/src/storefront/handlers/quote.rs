//! Storefront Quote Handler

use std::sync::Arc;

use redeem::{
    coupons::CouponId,
    discounts::AdjustedLine,
    items::LineItem,
    pricing::{MAX_PRICE, is_within_price_range},
};
use redeem_app::domain::storefront::{
    CartDiscount, CouponRef, LineQuote, Quote, QuoteCustomer, QuoteLine, QuoteRequest,
};
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, QueryParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    coupons::parse_decimal, extensions::*, observability::observe_quote, state::State,
    storefront::errors::into_status_error,
};

/// The shopper. Omit for guests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteCustomerBody {
    pub email: Option<String>,

    #[serde(default)]
    pub groups: Vec<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// A cart line to price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteLineBody {
    pub variant_id: String,
    pub product_id: String,
    pub sku: Option<String>,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Unit price as a decimal string
    pub unit_price: String,

    #[serde(default)]
    pub collections: Vec<String>,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Coupon the shopper picked for this line
    pub selected_coupon: Option<i64>,
}

/// Quote Request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteRequestBody {
    pub customer: Option<QuoteCustomerBody>,

    /// Codes entered by the shopper; manual coupons need one of these
    #[serde(default)]
    pub entered_codes: Vec<String>,

    pub lines: Vec<QuoteLineBody>,
}

impl QuoteLineBody {
    fn into_quote_line(self) -> Result<QuoteLine, StatusError> {
        let unit_price = parse_decimal("unit_price", &self.unit_price)?;

        if !is_within_price_range(unit_price) {
            return Err(StatusError::bad_request()
                .brief(format!("unit_price must be between 0 and {MAX_PRICE}")));
        }

        let mut item = LineItem::new(self.variant_id, self.product_id, unit_price)
            .with_quantity(self.quantity)
            .with_collections(self.collections)
            .with_categories(self.categories);

        if let Some(sku) = self.sku {
            item = item.with_sku(sku);
        }

        Ok(QuoteLine {
            item,
            selected_coupon: self.selected_coupon.map(CouponId::new),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponRefResponse {
    pub id: i64,
    pub code: String,
}

impl From<CouponRef> for CouponRefResponse {
    fn from(coupon: CouponRef) -> Self {
        Self {
            id: coupon.id.into_i64(),
            code: coupon.code.into_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineQuoteResponse {
    pub variant_id: String,
    pub quantity: u32,

    /// Every per-unit coupon that applies to the line
    pub applicable_coupons: Vec<CouponRefResponse>,

    /// The coupon priced into the line
    pub applied_coupon: Option<CouponRefResponse>,

    pub unit_price: String,
    pub discounted_unit_price: String,
    pub line_total: String,
}

impl From<LineQuote> for LineQuoteResponse {
    fn from(line: LineQuote) -> Self {
        Self {
            variant_id: line.item.variant_id().to_string(),
            quantity: line.item.quantity(),
            applicable_coupons: line.applicable.into_iter().map(Into::into).collect(),
            applied_coupon: line.applied.map(Into::into),
            unit_price: line.unit_price.to_string(),
            discounted_unit_price: line.discounted_unit_price.to_string(),
            line_total: line.line_total.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct AdjustedLineResponse {
    pub variant_id: String,

    /// Units granted at the get-discount
    pub granted_units: u32,

    pub discount: String,
    pub total: String,
}

impl From<&AdjustedLine> for AdjustedLineResponse {
    fn from(line: &AdjustedLine) -> Self {
        Self {
            variant_id: line.line().variant_id().to_string(),
            granted_units: line.granted_units(),
            discount: line.discount().to_string(),
            total: line.total().to_string(),
        }
    }
}

/// A buy-x-get-y coupon applied across the cart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartDiscountResponse {
    pub coupon: CouponRefResponse,
    pub lines: Vec<AdjustedLineResponse>,
    pub discount_total: String,
}

impl From<CartDiscount> for CartDiscountResponse {
    fn from(discount: CartDiscount) -> Self {
        Self {
            lines: discount.adjusted.lines().iter().map(Into::into).collect(),
            discount_total: discount.adjusted.discount_total().to_string(),
            coupon: discount.coupon.into(),
        }
    }
}

/// Quote Response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteResponse {
    pub lines: Vec<LineQuoteResponse>,
    pub cart_discount: Option<CartDiscountResponse>,
    pub subtotal: String,
    pub total: String,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            lines: quote.lines.into_iter().map(Into::into).collect(),
            cart_discount: quote.cart_discount.map(Into::into),
            subtotal: quote.subtotal.to_string(),
            total: quote.total.to_string(),
        }
    }
}

fn discounted_lines(quote: &Quote) -> usize {
    quote
        .lines
        .iter()
        .filter(|line| line.discounted_unit_price < line.unit_price)
        .count()
}

/// Storefront Quote Handler
///
/// Prices a cart for a shopper: every line gets its applicable coupons and a
/// discounted price, then any buy-x-get-y coupon is applied across the cart.
#[endpoint(
    tags("storefront"),
    summary = "Quote Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "The priced cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<QuoteRequestBody>,
    at: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<QuoteResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let now = at.into_point_in_time()?;
    let body = json.into_inner();

    let lines = body
        .lines
        .into_iter()
        .map(QuoteLineBody::into_quote_line)
        .collect::<Result<Vec<_>, _>>()?;

    let request = QuoteRequest {
        customer: body.customer.map(|customer| QuoteCustomer {
            email: customer.email,
            groups: customer.groups,
        }),
        entered_codes: body.entered_codes,
        lines,
        now,
    };

    let quote = state
        .storefront
        .quote(request)
        .await
        .map_err(into_status_error)?;

    observe_quote(
        quote.lines.len(),
        discounted_lines(&quote),
        quote.cart_discount.is_some(),
    );

    Ok(Json(quote.into()))
}
