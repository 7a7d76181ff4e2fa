//! Auth data models.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use uuid::Uuid;

use crate::auth::{ApiTokenVersion, AuthServiceError};

/// What a token may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create, list, update and delete coupons.
    ManageCoupons,

    /// Price carts on the storefront.
    QuoteCarts,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageCoupons => "manage_coupons",
            Self::QuoteCarts => "quote_carts",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AuthServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manage_coupons" => Ok(Self::ManageCoupons),
            "quote_carts" => Ok(Self::QuoteCarts),
            other => Err(AuthServiceError::UnknownCapability(other.to_string())),
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub token_uuid: Uuid,
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl Actor {
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// API token data used during bearer authentication.
#[derive(Debug, Clone)]
pub(crate) struct ActiveApiToken {
    pub name: String,

    /// Token format/hash version.
    pub version: ApiTokenVersion,

    /// SHA-256 verifier for the token secret material.
    pub token_hash: String,

    pub capabilities: Vec<Capability>,
}

/// API token metadata persisted in storage.
#[derive(Debug, Clone)]
pub struct ApiTokenMetadata {
    pub uuid: Uuid,
    pub name: String,
    pub version: ApiTokenVersion,
    pub capabilities: Vec<Capability>,
    pub created_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// New API token persistence payload.
#[derive(Debug, Clone)]
pub struct NewApiToken {
    pub uuid: Uuid,
    pub name: String,
    pub version: ApiTokenVersion,
    pub token_hash: String,
    pub capabilities: Vec<Capability>,
    pub expires_at: Option<Timestamp>,
}

/// API token issuance result with one-time raw token.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub metadata: ApiTokenMetadata,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn capabilities_parse_their_stored_form() -> TestResult {
        for capability in [Capability::ManageCoupons, Capability::QuoteCarts] {
            assert_eq!(capability.as_str().parse::<Capability>()?, capability);
        }

        assert!(matches!(
            "root".parse::<Capability>(),
            Err(AuthServiceError::UnknownCapability(_))
        ));

        Ok(())
    }

    #[test]
    fn actors_only_hold_granted_capabilities() {
        let actor = Actor {
            token_uuid: Uuid::nil(),
            name: "storefront".to_string(),
            capabilities: vec![Capability::QuoteCarts],
        };

        assert!(actor.can(Capability::QuoteCarts));
        assert!(!actor.can(Capability::ManageCoupons));
    }
}
