//! Identity seam for the external token verifier.
//!
//! The hub never verifies tokens itself; it consumes an identity provider
//! as a capability. Request-scoped code receives an already-verified
//! [`Identity`] and derives ownership scopes from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{HubError, HubResult};

/// A verified caller identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier (tenant/user key for ownership scoping)
    pub subject_id: String,

    /// Email address, if the provider exposes one
    pub email: Option<String>,

    /// Display name, if the provider exposes one
    pub display_name: Option<String>,
}

impl Identity {
    /// Create an identity with just a subject id.
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Trait for the external identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify an opaque bearer token.
    ///
    /// Returns the caller identity, or `HubError::Unauthorized` if the
    /// token is missing, expired, or unknown.
    async fn verify(&self, token: &str) -> HubResult<Identity>;
}

/// Shared-secret verifier backed by a static token map.
///
/// Used by the CLI and tests; real deployments plug in their identity
/// provider behind [`TokenVerifier`].
#[derive(Debug, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
    /// Create an empty verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an identity.
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> HubResult<Identity> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| HubError::Unauthorized("Unknown token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier_known_token() {
        let verifier =
            StaticVerifier::new().with_token("secret", Identity::new("tenant-1"));

        let identity = verifier.verify("secret").await.unwrap();
        assert_eq!(identity.subject_id, "tenant-1");
    }

    #[tokio::test]
    async fn test_static_verifier_unknown_token() {
        let verifier = StaticVerifier::new();
        let result = verifier.verify("nope").await;
        assert!(matches!(result, Err(HubError::Unauthorized(_))));
    }
}
