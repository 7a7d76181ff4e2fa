//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database,
    domain::{
        coupons::{
            repositories::PgCouponsRepository,
            service::{CouponsManager, CouponsService},
        },
        customers::PgCustomerSpendLookup,
        storefront::{StorefrontManager, StorefrontService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub coupons: Arc<dyn CouponsService>,
    pub storefront: Arc<dyn StorefrontService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, max_connections: u32) -> Result<Self, AppInitError> {
        let pool = database::connect_with_max_connections(url, max_connections)
            .await
            .map_err(AppInitError::Database)?;

        let coupons: Arc<dyn CouponsService> = Arc::new(CouponsManager::new(Arc::new(
            PgCouponsRepository::new(pool.clone()),
        )));

        let storefront = Arc::new(StorefrontManager::new(
            Arc::clone(&coupons),
            Arc::new(PgCustomerSpendLookup::new(pool.clone())),
        ));

        Ok(Self {
            coupons,
            storefront,
            auth: Arc::new(PgAuthService::new(pool)),
        })
    }
}
