//! Coupon Status Handler

use std::sync::Arc;

use redeem_app::domain::coupons::records::CouponId;
use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{coupons::errors::into_status_error, extensions::*, state::State};

/// Coupon Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatusRequest {
    /// Whether the coupon is enabled
    pub status: bool,
}

/// Coupon Status Handler
///
/// Enables or disables a coupon. Disabled coupons are never offered.
#[endpoint(
    tags("coupons"),
    summary = "Set Coupon Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    coupon: PathParam<i64>,
    json: JsonBody<StatusRequest>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .coupons
        .set_status(CouponId::new(coupon.into_inner()), json.into_inner().status)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use redeem_app::domain::coupons::{CouponsServiceError, service::MockCouponsService};
    use salvo::test::TestClient;
    use serde_json::json;

    use crate::test_helpers::coupons_service;

    use super::*;

    fn make_service(coupons: MockCouponsService) -> Service {
        coupons_service(coupons, Router::with_path("coupons/{coupon}/status").put(handler))
    }

    #[tokio::test]
    async fn test_disable_coupon() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_set_status()
            .once()
            .withf(|id, status| *id == CouponId::new(9) && !*status)
            .return_once(|_, _| Ok(()));

        let res = TestClient::put("http://example.com/coupons/9/status")
            .json(&json!({ "status": false }))
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_status_of_missing_coupon_returns_404() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_set_status()
            .once()
            .return_once(|_, _| Err(CouponsServiceError::NotFound));

        let res = TestClient::put("http://example.com/coupons/9/status")
            .json(&json!({ "status": true }))
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }
}
