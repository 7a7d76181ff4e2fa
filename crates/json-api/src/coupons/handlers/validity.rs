//! Coupon Validity Handler

use std::sync::Arc;

use redeem::coupons::ValidityWindow;
use redeem_app::domain::coupons::records::CouponId;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    coupons::{errors::into_status_error, models::parse_timestamp},
    extensions::*,
    state::State,
};

/// Coupon Validity Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidityRequest {
    /// RFC 3339 timestamp
    pub start_timestamp: String,

    /// RFC 3339 timestamp, not before the start
    pub end_timestamp: String,
}

/// Coupon Validity Handler
///
/// Moves the window in which a coupon may be used.
#[endpoint(
    tags("coupons"),
    summary = "Update Coupon Validity",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Validity updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    coupon: PathParam<i64>,
    json: JsonBody<ValidityRequest>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let window = ValidityWindow::new(
        parse_timestamp("start_timestamp", &request.start_timestamp)?,
        parse_timestamp("end_timestamp", &request.end_timestamp)?,
    )
    .or_400("invalid validity window")?;

    state
        .coupons
        .update_validity(CouponId::new(coupon.into_inner()), window)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}
