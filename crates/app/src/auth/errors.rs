//! Errors authenticating bearer tokens and managing them.

use thiserror::Error;

use crate::auth::ApiTokenError;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Unknown, malformed, expired or revoked token. Surfaces as 401.
    #[error("token not found")]
    NotFound,

    #[error("token store error")]
    Sql(#[from] sqlx::Error),

    #[error("token processing error")]
    Token(#[from] ApiTokenError),

    /// A stored token grants a capability this build does not know.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}
