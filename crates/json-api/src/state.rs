//! State

use std::sync::Arc;

use redeem_app::{
    auth::AuthService,
    context::AppContext,
    domain::{coupons::service::CouponsService, storefront::StorefrontService},
};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) coupons: Arc<dyn CouponsService>,
    pub(crate) storefront: Arc<dyn StorefrontService>,
    pub(crate) auth: Arc<dyn AuthService>,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        coupons: Arc<dyn CouponsService>,
        storefront: Arc<dyn StorefrontService>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        Self {
            coupons,
            storefront,
            auth,
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self::new(app.coupons, app.storefront, app.auth))
    }
}
