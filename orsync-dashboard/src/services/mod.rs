//! External collaborators of the dashboard core
//!
//! The identity resolver and the following reconciler only talk to these
//! traits. Production wiring uses the ORCID public API and OAuth token
//! endpoint, the social-graph backend and an in-process credential store;
//! tests substitute fakes.

pub mod credential_store;
pub mod graph_client;
pub mod oauth_client;
pub mod orcid_client;

pub use credential_store::InMemoryCredentialStore;
pub use graph_client::SocialGraphClient;
pub use oauth_client::OrcidOAuthClient;
pub use orcid_client::OrcidClient;

use async_trait::async_trait;
use orsync_common::{Identity, ResearcherSummary, StoredCredential};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors from remote collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Local session storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credential saved by the last sign-in, if any
    async fn stored_credential(&self) -> Option<StoredCredential>;

    async fn store(&self, credential: StoredCredential);

    async fn clear(&self);
}

/// Researcher profile lookups
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Full identity for one researcher
    ///
    /// The returned identity always has `authenticated = false`; session
    /// status is decided by the identity resolver.
    async fn fetch_identity_by_id(&self, id: &str) -> Result<Identity, ServiceError>;

    /// Summaries for many researchers in a single request
    ///
    /// May return fewer entries than requested, in any order.
    async fn fetch_summaries_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<ResearcherSummary>, ServiceError>;
}

/// Follow relationships between researchers
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// IDs followed by `my_id`, in the order the backend keeps them
    async fn fetch_followed_ids(&self, my_id: &str) -> Result<Vec<String>, ServiceError>;

    async fn request_follow(&self, my_id: &str, target_id: &str) -> Result<(), ServiceError>;

    async fn request_unfollow(&self, my_id: &str, target_id: &str) -> Result<(), ServiceError>;
}

/// Result of a successful authorization-code exchange
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// ORCID iD of the researcher who granted access
    pub orcid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("orcid", &self.orcid)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// OAuth token endpoint
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Trade an authorization code from the sign-in callback for a token
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ServiceError>;
}
