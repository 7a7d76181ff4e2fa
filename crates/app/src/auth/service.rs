//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{
    Actor, ApiTokenMetadata, ApiTokenVersion, AuthServiceError, Capability, IssuedApiToken,
    NewApiToken, format_api_token, generate_api_token_secret, parse_api_token,
    repository::PgAuthRepository, token_verifier, verifiers_match,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
        }
    }

    /// Issue a new API token. The raw token is only available from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if database insertion fails.
    #[tracing::instrument(
        name = "auth.service.issue_api_token",
        skip(self, capabilities),
        fields(token_uuid = tracing::field::Empty),
        err
    )]
    pub async fn issue_api_token(
        &self,
        name: String,
        capabilities: Vec<Capability>,
        expires_at: Option<Timestamp>,
    ) -> Result<IssuedApiToken, AuthServiceError> {
        let token_uuid = Uuid::now_v7();
        let version = ApiTokenVersion::V1;
        let secret = generate_api_token_secret();
        let token = format_api_token(token_uuid, version, &secret);
        let token_hash = token_verifier(&token_uuid, version, &secret);

        tracing::Span::current().record("token_uuid", tracing::field::display(token_uuid));

        let metadata = self
            .repository
            .create_api_token(&NewApiToken {
                uuid: token_uuid,
                name,
                version,
                token_hash,
                capabilities,
                expires_at,
            })
            .await?;

        info!(token_uuid = %metadata.uuid, "issued api token");

        Ok(IssuedApiToken { token, metadata })
    }

    /// List every token, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_api_tokens(&self) -> Result<Vec<ApiTokenMetadata>, AuthServiceError> {
        self.repository
            .list_api_tokens()
            .await
            .map_err(AuthServiceError::from)
    }

    /// Revoke a token by UUID. Returns `true` if the token was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<bool, AuthServiceError> {
        self.repository
            .revoke_api_token(token_uuid)
            .await
            .map(|record| record.is_some())
            .map_err(AuthServiceError::from)
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    #[tracing::instrument(name = "auth.service.authenticate_bearer", skip_all, err)]
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError> {
        let parsed_token =
            parse_api_token(bearer_token).map_err(|_err| AuthServiceError::NotFound)?;

        let token = self
            .repository
            .find_active_api_token_by_uuid(parsed_token.token_uuid, parsed_token.version)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        if token.version != parsed_token.version {
            return Err(AuthServiceError::NotFound);
        }

        let verifier = token_verifier(
            &parsed_token.token_uuid,
            parsed_token.version,
            &parsed_token.secret,
        );

        if !verifiers_match(&token.token_hash, &verifier) {
            return Err(AuthServiceError::NotFound);
        }

        // Best-effort metadata update; auth success should not depend on this write.
        if let Err(error) = self
            .repository
            .touch_api_token_last_used(parsed_token.token_uuid)
            .await
        {
            debug!(error = %error, "failed to record token use");
        }

        Ok(Actor {
            token_uuid: parsed_token.token_uuid,
            name: token.name,
            capabilities: token.capabilities,
        })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError>;
}
