//! Customers
//!
//! Historical spend, read from the order history rollup.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use sqlx::{PgPool, query_scalar};
use thiserror::Error;

const FIND_PURCHASED_TOTAL_SQL: &str = include_str!("sql/find_purchased_total.sql");

#[derive(Debug, Error)]
pub enum CustomerSpendError {
    #[error("failed to read customer spend")]
    Sql(#[from] sqlx::Error),
}

#[automock]
#[async_trait]
pub trait CustomerSpendLookup: Send + Sync {
    /// The customer's historical purchase total, or `None` when nothing is recorded.
    async fn purchased_total(&self, email: &str) -> Result<Option<Decimal>, CustomerSpendError>;
}

#[derive(Debug, Clone)]
pub struct PgCustomerSpendLookup {
    pool: PgPool,
}

impl PgCustomerSpendLookup {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerSpendLookup for PgCustomerSpendLookup {
    #[tracing::instrument(name = "customers.spend.purchased_total", skip_all, err)]
    async fn purchased_total(&self, email: &str) -> Result<Option<Decimal>, CustomerSpendError> {
        Ok(query_scalar(FIND_PURCHASED_TOTAL_SQL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }
}
