//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use redeem::{
    conditions::{OrderConditions, TargetVariants, UsageConditions},
    coupons::{Coupon, CouponCode, CouponType, ValidityWindow},
    discounts::Discount,
    pricing::Percent,
};
use redeem_app::{
    auth::{Actor, Capability, MockAuthService},
    domain::{
        coupons::{records::CouponId, service::MockCouponsService},
        storefront::MockStorefrontService,
    },
};
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) fn test_actor() -> Actor {
    Actor {
        token_uuid: Uuid::nil(),
        name: "test".to_string(),
        capabilities: vec![Capability::ManageCoupons, Capability::QuoteCarts],
    }
}

#[salvo::handler]
pub(crate) async fn inject_actor(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(test_actor());
    ctrl.call_next(req, depot, res).await;
}

fn strict_coupons_mock() -> MockCouponsService {
    let mut coupons = MockCouponsService::new();

    coupons.expect_create_coupon().never();
    coupons.expect_delete_coupon().never();
    coupons.expect_set_status().never();
    coupons.expect_update_validity().never();
    coupons.expect_search_coupons().never();
    coupons.expect_get_coupon().never();
    coupons.expect_active_coupons().never();

    coupons
}

fn strict_storefront_mock() -> MockStorefrontService {
    let mut storefront = MockStorefrontService::new();

    storefront.expect_quote().never();

    storefront
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();

    auth
}

pub(crate) fn state_with_coupons(coupons: MockCouponsService) -> Arc<State> {
    Arc::new(State::new(
        Arc::new(coupons),
        Arc::new(strict_storefront_mock()),
        Arc::new(strict_auth_mock()),
    ))
}

pub(crate) fn state_with_storefront(storefront: MockStorefrontService) -> Arc<State> {
    Arc::new(State::new(
        Arc::new(strict_coupons_mock()),
        Arc::new(storefront),
        Arc::new(strict_auth_mock()),
    ))
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    Arc::new(State::new(
        Arc::new(strict_coupons_mock()),
        Arc::new(strict_storefront_mock()),
        Arc::new(auth),
    ))
}

pub(crate) fn coupons_service(coupons: MockCouponsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_coupons(coupons)))
            .hoop(inject_actor)
            .push(route),
    )
}

pub(crate) fn storefront_service(storefront: MockStorefrontService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_storefront(storefront)))
            .hoop(inject_actor)
            .push(route),
    )
}

/// An enabled, automatic 10% coupon open through 2026.
pub(crate) fn make_coupon(id: i64, code: &str) -> Result<Coupon, Box<dyn std::error::Error>> {
    Ok(Coupon {
        id: CouponId::new(id),
        code: CouponCode::parse(code)?,
        coupon_type: CouponType::Automatic,
        description: Some("ten off".to_string()),
        status: true,
        discount: Discount::Percentage(Percent::new(Decimal::TEN)?),
        validity: ValidityWindow::new(
            "2026-01-01T00:00:00Z".parse::<Timestamp>()?,
            "2026-12-31T23:59:59Z".parse::<Timestamp>()?,
        )?,
        usage: UsageConditions::default(),
        targets: TargetVariants::default(),
        customer: None,
        order_conditions: OrderConditions::default(),
        created_at: Timestamp::UNIX_EPOCH,
    })
}
