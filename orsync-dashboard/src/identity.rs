//! Identity resolution
//!
//! Decides which researcher is "the current user" and whether the session
//! counts as signed in. Debug mode takes precedence over everything: when it
//! is enabled the configured debug identity is used and the session is always
//! treated as authenticated, without touching the credential store.
//!
//! Every authentication check in the service goes through
//! [`IdentityResolver::is_effectively_authenticated`] (directly or via
//! [`SessionState`]) instead of inspecting stored credentials.
//!
//! Nothing here is cached: session state is derived again on every call.

use orsync_common::config::DebugConfig;
use orsync_common::{orcid_id, Identity, StoredCredential};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::DashboardError;
use crate::services::{CredentialStore, ProfileDirectory};

/// Identifier in effect for a stored credential under the debug policy
///
/// Never empty: with no usable stored ID the debug identifier is returned as
/// a last resort, so callers always have something to query with.
pub fn resolve_effective_identifier(debug: &DebugConfig, stored_id: Option<&str>) -> String {
    if debug.enabled {
        return debug.orcid_id.clone();
    }

    match stored_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => debug.orcid_id.clone(),
    }
}

/// Authentication status under the debug policy
pub fn is_effectively_authenticated(debug: &DebugConfig, actually_authenticated: bool) -> bool {
    debug.enabled || actually_authenticated
}

/// Session status derived from the credential store and debug settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// ID held by the credential store, if any
    pub stored_id: Option<String>,
    /// ID to query with
    pub effective_id: String,
    pub authenticated: bool,
    /// Whether the stored credential carries an OAuth access token
    pub access_token_available: bool,
    pub debug_active: bool,
}

impl SessionState {
    /// A stored credential counts as a real sign-in only when it carries the
    /// access token obtained from the ORCID code exchange.
    pub fn derive(debug: &DebugConfig, stored: Option<&StoredCredential>) -> Self {
        let stored_id = stored
            .map(|c| c.orcid_id.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let access_token_available = stored
            .and_then(|c| c.access_token.as_deref())
            .map_or(false, |token| !token.trim().is_empty());
        let actually_authenticated = stored_id.is_some() && access_token_available;

        Self {
            effective_id: resolve_effective_identifier(debug, stored_id.as_deref()),
            authenticated: is_effectively_authenticated(debug, actually_authenticated),
            access_token_available,
            debug_active: debug.enabled,
            stored_id,
        }
    }

    /// ID allowed to perform follow/unfollow, `None` when signed out
    ///
    /// The effective ID falls back to the debug identifier even when signed
    /// out; that fallback is for reads only.
    pub fn acting_id(&self) -> Option<&str> {
        self.authenticated.then_some(self.effective_id.as_str())
    }
}

/// Resolves the effective identity for the current session
pub struct IdentityResolver {
    debug: DebugConfig,
    credentials: Arc<dyn CredentialStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl IdentityResolver {
    pub fn new(
        debug_config: DebugConfig,
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        if debug_config.enabled {
            warn!(
                orcid_id = %debug_config.orcid_id,
                "Debug mode active: using simulated identity and session"
            );
        }
        Self {
            debug: debug_config,
            credentials,
            profiles,
        }
    }

    pub fn debug_active(&self) -> bool {
        self.debug.enabled
    }

    pub fn is_debug_identifier(&self, id: &str) -> bool {
        orcid_id::clean(id).map_or(false, |id| id == self.debug.orcid_id)
    }

    pub fn resolve_effective_identifier(&self, stored_id: Option<&str>) -> String {
        resolve_effective_identifier(&self.debug, stored_id)
    }

    pub fn is_effectively_authenticated(&self, actually_authenticated: bool) -> bool {
        is_effectively_authenticated(&self.debug, actually_authenticated)
    }

    /// Derive session state from the credential store
    pub async fn session(&self) -> SessionState {
        let stored = self.credentials.stored_credential().await;
        SessionState::derive(&self.debug, stored.as_ref())
    }

    /// ID allowed to perform mutations, `None` when signed out
    pub async fn acting_identifier(&self) -> Option<String> {
        self.session().await.acting_id().map(str::to_string)
    }

    /// Static simulated identity used in debug mode
    pub fn debug_identity(&self) -> Identity {
        Identity {
            id: self.debug.orcid_id.clone(),
            display_name: self.debug.name.clone(),
            email: self.debug.email.clone(),
            affiliation: self.debug.affiliation.clone(),
            location: self.debug.location.clone(),
            profile_url: orcid_id::profile_url(&self.debug.orcid_id),
            authenticated: true,
        }
    }

    /// Look up one identity, without any debug fallback
    pub async fn fetch_identity(&self, id: &str) -> Result<Identity, DashboardError> {
        self.profiles
            .fetch_identity_by_id(id)
            .await
            .map_err(|e| DashboardError::lookup(id, e))
    }

    /// Identity of the current session
    ///
    /// With debug mode on, a failed lookup yields the debug identity and the
    /// error is dropped. With debug mode off the failure is returned.
    pub async fn current_identity(&self) -> Result<Identity, DashboardError> {
        let session = self.session().await;
        debug!(
            effective_id = %session.effective_id,
            debug_active = session.debug_active,
            "Fetching current identity"
        );

        match self.fetch_identity(&session.effective_id).await {
            Ok(mut identity) => {
                identity.authenticated = session.authenticated;
                Ok(identity)
            }
            Err(e) if self.debug.enabled => {
                warn!(error = %e, "Identity lookup failed in debug mode, using debug identity");
                Ok(self.debug_identity())
            }
            Err(e) => {
                error!(error = %e, "Identity lookup failed");
                Err(e)
            }
        }
    }
}
