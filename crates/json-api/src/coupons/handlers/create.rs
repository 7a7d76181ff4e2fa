//! Create Coupon Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    coupons::{errors::into_status_error, models::CreateCouponRequest},
    extensions::*,
    state::State,
};

/// Coupon Created Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponCreatedResponse {
    /// Created coupon id
    pub id: i64,
}

/// Create Coupon Handler
///
/// Validates the coupon and writes it together with its conditions. A failed
/// write leaves no partial coupon behind.
#[endpoint(
    tags("coupons"),
    summary = "Create Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Coupon created"),
        (status_code = StatusCode::CONFLICT, description = "Coupon code already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCouponRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CouponCreatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let (coupon, coupon_type) = json.into_inner().into_new_coupon()?;

    let id = state
        .coupons
        .create_coupon(coupon, coupon_type)
        .await
        .map_err(into_status_error)?
        .into_i64();

    res.add_header(LOCATION, format!("/coupons/{id}"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(CouponCreatedResponse { id }))
}

#[cfg(test)]
mod tests {
    use redeem::{coupons::CouponType, discounts::DiscountType};
    use redeem_app::domain::coupons::{
        CouponsServiceError, ValidationError, records::CouponId, service::MockCouponsService,
    };
    use rust_decimal_macros::dec;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use crate::test_helpers::coupons_service;

    use super::*;

    fn make_service(coupons: MockCouponsService) -> Service {
        coupons_service(coupons, Router::with_path("coupons").post(handler))
    }

    fn request_body(discount_value: &str) -> Value {
        json!({
            "code": "SAVE10",
            "coupon_type": "manual",
            "discount_type": "fixed",
            "discount_value": discount_value,
            "start_timestamp": "2026-01-01T00:00:00Z",
            "end_timestamp": "2026-02-01T00:00:00Z",
            "specific_target_products": ["SKU-1"],
        })
    }

    #[tokio::test]
    async fn test_create_coupon_success() -> TestResult {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_create_coupon()
            .once()
            .withf(|coupon, coupon_type| {
                coupon.code == "SAVE10"
                    && coupon.status
                    && coupon.discount_type == DiscountType::Fixed
                    && coupon.discount_value == Some(dec!(10.00))
                    && coupon.specific_target_products == ["SKU-1"]
                    && *coupon_type == CouponType::Manual
            })
            .return_once(|_, _| Ok(CouponId::new(42)));

        let mut res = TestClient::post("http://example.com/coupons")
            .json(&request_body("10.00"))
            .send(&make_service(coupons))
            .await;

        let body: CouponCreatedResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some("/coupons/42"));
        assert_eq!(body.id, 42);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_coupon_duplicate_code_returns_409() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_create_coupon()
            .once()
            .return_once(|_, _| Err(CouponsServiceError::DuplicateCode));

        let res = TestClient::post("http://example.com/coupons")
            .json(&request_body("10.00"))
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn test_create_coupon_validation_failure_returns_400() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_create_coupon()
            .once()
            .return_once(|_, _| Err(CouponsServiceError::Validation(ValidationError::EmptyTarget)));

        let res = TestClient::post("http://example.com/coupons")
            .json(&request_body("10.00"))
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_create_coupon_unparseable_money_never_reaches_the_service() {
        let mut coupons = MockCouponsService::new();

        coupons.expect_create_coupon().never();

        let res = TestClient::post("http://example.com/coupons")
            .json(&request_body("ten"))
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
