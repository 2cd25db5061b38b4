//! Thin API-key authentication contract for Cairn.
//!
//! The retrieval core treats authentication as an external collaborator — the HTTP adapter layer
//! that sits in front of `search`/ `store` is responsible for the actual credential store, key
//! rotation, and CORS policy. What lives here is the seam: the trait a caller implements to plug in
//! whatever auth system the deployment uses, plus a static single-key implementation that is enough
//! to run the core standalone (e.g. from `cairn-cli`) without wiring up a real identity provider.

use async_trait::async_trait;

/// The project scope an authenticated caller is allowed to search and write within. Mirrors the
/// `project` parameter of the core `search` operation: one project, many, or every project the
/// caller owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    One(String),
    Many(Vec<String>),
    All,
}

/// Outcome of authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub caller_id: String,
    pub scope: ProjectScope,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing API key")]
    MissingKey,
    #[error("invalid API key")]
    InvalidKey,
}

/// Seam a deployment implements to plug in its own credential store.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve an API key to an [`AuthContext`], or reject it.
    ///
    /// # Errors
    /// Returns [`AuthError`] if the key is missing or unrecognized.
    async fn authenticate(&self, api_key: Option<&str>) -> Result<AuthContext, AuthError>;
}

/// Single-key authenticator: every request presenting the configured key
/// is granted [`ProjectScope::All`]. Adequate for running the core
/// standalone; production deployments supply their own [`Authenticator`].
pub struct StaticKeyAuthenticator {
    expected_key: String,
}

impl StaticKeyAuthenticator {
    #[must_use]
    pub fn new(expected_key: impl Into<String>) -> Self {
        Self { expected_key: expected_key.into() }
    }
}

#[async_trait]
impl Authenticator for StaticKeyAuthenticator {
    async fn authenticate(&self, api_key: Option<&str>) -> Result<AuthContext, AuthError> {
        let key = api_key.ok_or(AuthError::MissingKey)?;
        if key == self.expected_key {
            Ok(AuthContext { caller_id: "static".to_string(), scope: ProjectScope::All })
        } else {
            Err(AuthError::InvalidKey)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_missing_key() {
        let auth = StaticKeyAuthenticator::new("secret");
        assert_eq!(auth.authenticate(None).await, Err(AuthError::MissingKey));
    }

    #[tokio::test]
    async fn rejects_wrong_key() {
        let auth = StaticKeyAuthenticator::new("secret");
        assert_eq!(auth.authenticate(Some("wrong")).await, Err(AuthError::InvalidKey));
    }

    #[tokio::test]
    async fn accepts_correct_key_with_full_scope() {
        let auth = StaticKeyAuthenticator::new("secret");
        let ctx = auth.authenticate(Some("secret")).await.unwrap();
        assert_eq!(ctx.scope, ProjectScope::All);
    }
}
