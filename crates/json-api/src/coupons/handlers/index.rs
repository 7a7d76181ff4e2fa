//! Coupon Index Handler

use std::sync::Arc;

use redeem_app::domain::coupons::query::CouponQuery;
use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    coupons::{errors::into_status_error, models::CouponSummaryResponse},
    extensions::*,
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponsResponse {
    /// The requested page of coupons
    pub coupons: Vec<CouponSummaryResponse>,

    /// Matching coupons across all pages
    pub total: u64,

    pub offset: u64,
    pub limit: u64,
}

/// Coupon Index Handler
///
/// Lists coupons, newest first, optionally filtered by a case-sensitive code
/// substring.
#[endpoint(
    tags("coupons"),
    summary = "List Coupons",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "A page of coupons"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    code: QueryParam<String, false>,
    offset: QueryParam<u64, false>,
    limit: QueryParam<u64, false>,
    depot: &mut Depot,
) -> Result<Json<CouponsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let query = CouponQuery {
        code: code.into_inner(),
        offset: offset.into_inner().unwrap_or_default(),
        limit: limit.into_inner(),
    };

    let page = state
        .coupons
        .search_coupons(query)
        .await
        .into_result()
        .map_err(into_status_error)?;

    Ok(Json(CouponsResponse {
        coupons: page.items.into_iter().map(Into::into).collect(),
        total: page.total,
        offset: page.offset,
        limit: page.limit,
    }))
}

#[cfg(test)]
mod tests {
    use redeem_app::domain::coupons::{
        CouponsServiceError, StoreError,
        query::{Loaded, Page},
        records::CouponRecord,
        service::MockCouponsService,
    };
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{coupons_service, make_coupon};

    use super::*;

    fn make_service(coupons: MockCouponsService) -> Service {
        coupons_service(coupons, Router::with_path("coupons").get(handler))
    }

    fn summary(id: i64, code: &str) -> Result<CouponRecord, Box<dyn std::error::Error>> {
        let coupon = make_coupon(id, code)?;

        Ok(CouponRecord {
            id: coupon.id,
            code: coupon.code,
            coupon_type: coupon.coupon_type,
            description: coupon.description,
            status: coupon.status,
            discount: coupon.discount,
            validity: coupon.validity,
            usage: coupon.usage,
            created_at: coupon.created_at,
        })
    }

    #[tokio::test]
    async fn test_index_returns_the_page() -> TestResult {
        let items = vec![summary(2, "SAVE20")?, summary(1, "SAVE10")?];

        let mut coupons = MockCouponsService::new();

        coupons
            .expect_search_coupons()
            .once()
            .withf(|query| {
                *query
                    == CouponQuery {
                        code: Some("SAVE".to_string()),
                        offset: 0,
                        limit: Some(2),
                    }
            })
            .return_once(move |_| {
                Loaded::ok(Page {
                    items,
                    total: 5,
                    offset: 0,
                    limit: 2,
                })
            });

        let mut res = TestClient::get("http://example.com/coupons?code=SAVE&limit=2")
            .send(&make_service(coupons))
            .await;

        let body: CouponsResponse = res.take_json().await?;
        let codes: Vec<_> = body.coupons.iter().map(|c| c.code.as_str()).collect();

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(codes, ["SAVE20", "SAVE10"]);
        assert_eq!(body.total, 5);
        assert_eq!(body.limit, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_index_without_params_uses_defaults() -> TestResult {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_search_coupons()
            .once()
            .withf(|query| *query == CouponQuery::default())
            .return_once(|_| Loaded::ok(Page::default()));

        let mut res = TestClient::get("http://example.com/coupons")
            .send(&make_service(coupons))
            .await;

        let body: CouponsResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.coupons.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_index_store_failure_returns_500() {
        let mut coupons = MockCouponsService::new();

        coupons
            .expect_search_coupons()
            .once()
            .return_once(|_| Loaded::failed(CouponsServiceError::Persistence(StoreError::RowNotFound)));

        let res = TestClient::get("http://example.com/coupons")
            .send(&make_service(coupons))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
