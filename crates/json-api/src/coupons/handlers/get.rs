//! Get Coupon Handler

use std::sync::Arc;

use redeem_app::domain::coupons::records::CouponId;
use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    coupons::{errors::into_status_error, models::CouponResponse},
    extensions::*,
    state::State,
};

/// Get Coupon Handler
///
/// Returns a coupon with its targets, customer restrictions and order conditions.
#[endpoint(
    tags("coupons"),
    summary = "Get Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "The coupon"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    coupon: PathParam<i64>,
    depot: &mut Depot,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let coupon = state
        .coupons
        .get_coupon(CouponId::new(coupon.into_inner()))
        .await
        .into_result()
        .map_err(into_status_error)?
        .ok_or_else(|| StatusError::not_found().brief("Coupon not found"))?;

    Ok(Json(coupon.into()))
}

#[cfg(test)]
mod tests {
    use redeem_app::domain::coupons::{
        CouponsServiceError, StoreError, query::Loaded, service::MockCouponsService,
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{coupons_service, make_coupon};

    use super::*;

    fn make_service(coupons: MockCouponsService) -> Service {
        coupons_service(coupons, Router::with_path("coupons/{coupon}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_200() -> TestResult {
        let coupon = make_coupon(7, "TEN")?;

        let mut coupons = MockCouponsService::new();

        coupons
            .expect_get_coupon()
            .once()
            .withf(|id| *id == CouponId::new(7))
            .return_once(move |_| Loaded::ok(Some(coupon)));

        let mut res = TestClient::get("http://example.com/coupons/7")
            .send(&make_service(coupons))
            .await;

        let body: CouponResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.id, 7);
        assert_eq!(body.code, "TEN");
        assert_eq!(body.discount.discount_type, "percentage");
        assert_eq!(body.discount.discount_value.as_deref(), Some("10"));
        assert!(body.specific_target_products.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_coupon_returns_404() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_get_coupon()
            .once()
            .return_once(|_| Loaded::ok(None));

        let res = TestClient::get("http://example.com/coupons/404")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_get_load_failure_returns_500() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_get_coupon()
            .once()
            .return_once(|_| Loaded::failed(CouponsServiceError::Persistence(StoreError::RowNotFound)));

        let res = TestClient::get("http://example.com/coupons/7")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_get_non_numeric_id_returns_400() {
        let mut coupons = MockCouponsService::new();

        coupons.expect_get_coupon().never();

        let res = TestClient::get("http://example.com/coupons/abc")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
