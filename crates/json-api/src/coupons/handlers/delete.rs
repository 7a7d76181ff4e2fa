//! Delete Coupon Handler

use std::sync::Arc;

use redeem_app::domain::coupons::records::CouponId;
use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{coupons::errors::into_status_error, extensions::*, state::State};

/// Delete Coupon Handler
///
/// Removes the coupon and every condition attached to it.
#[endpoint(
    tags("coupons"),
    summary = "Delete Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "coupons.delete", skip(coupon, depot), fields(coupon_id = tracing::field::Empty), err)]
pub(crate) async fn handler(
    coupon: PathParam<i64>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let coupon = coupon.into_inner();

    tracing::Span::current().record("coupon_id", coupon);

    state
        .coupons
        .delete_coupon(CouponId::new(coupon))
        .await
        .map_err(into_status_error)?;

    tracing::info!(coupon_id = coupon, "deleted coupon");

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use redeem_app::domain::coupons::{CouponsServiceError, service::MockCouponsService};
    use salvo::test::TestClient;

    use crate::test_helpers::coupons_service;

    use super::*;

    fn make_service(coupons: MockCouponsService) -> Service {
        coupons_service(coupons, Router::with_path("coupons/{coupon}").delete(handler))
    }

    #[tokio::test]
    async fn test_delete_coupon_success() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_delete_coupon()
            .once()
            .withf(|id| *id == CouponId::new(3))
            .return_once(|_| Ok(()));

        let res = TestClient::delete("http://example.com/coupons/3")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_delete_missing_coupon_returns_404() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_delete_coupon()
            .once()
            .return_once(|_| Err(CouponsServiceError::NotFound));

        let res = TestClient::delete("http://example.com/coupons/3")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }
}
