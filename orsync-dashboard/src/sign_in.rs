//! ORCID OAuth sign-in
//!
//! 1. `/oauth/authorize` issues a `state` value and sends the browser to the
//!    ORCID authorization page.
//! 2. ORCID redirects back to `/oauth/callback` with `code` and `state`.
//!    The state must be one this process issued and not yet used. The code is
//!    exchanged for an access token and the credential is stored.
//! 3. The browser is redirected to the front end's `/auth/success` or
//!    `/auth/error` page.
//!
//! Credentials written here always carry the access token from the exchange.
//! A stored credential without a token never makes a session authenticated.

use orsync_common::config::{OAuthConfig, OrcidConfig};
use orsync_common::{orcid_id, StoredCredential};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::SignInError;
use crate::services::{CredentialStore, TokenExchange};

/// Outstanding `state` values kept for callbacks; older ones are forgotten
const MAX_PENDING_STATES: usize = 32;
const STATE_LEN: usize = 43;

/// Query of `GET /oauth/authorize`
///
/// The optional name, email and iD fields pre-fill the ORCID form.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeQuery {
    pub scope: Option<String>,
    pub state: Option<String>,
    pub given_names: Option<String>,
    pub family_names: Option<String>,
    pub email: Option<String>,
    pub orcid: Option<String>,
}

/// Query of `GET /oauth/callback`
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Body of `GET /oauth/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthStatus {
    pub orcid_base_url: String,
    pub client_id_configured: bool,
    pub client_secret_configured: bool,
    pub redirect_uri_configured: bool,
    pub endpoints: OAuthEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthEndpoints {
    pub authorize: &'static str,
    pub callback: &'static str,
    pub status: &'static str,
}

/// Drives the authorization-code flow and writes the resulting credential
pub struct SignInFlow {
    orcid_base_url: String,
    authorize_endpoint: String,
    settings: OAuthConfig,
    exchange: Arc<dyn TokenExchange>,
    credentials: Arc<dyn CredentialStore>,
    pending_states: Mutex<VecDeque<String>>,
}

impl SignInFlow {
    pub fn new(
        orcid: &OrcidConfig,
        settings: OAuthConfig,
        exchange: Arc<dyn TokenExchange>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            orcid_base_url: orcid.base_url.clone(),
            authorize_endpoint: orcid.authorize_endpoint(),
            settings,
            exchange,
            credentials,
            pending_states: Mutex::new(VecDeque::new()),
        }
    }

    /// ORCID authorization URL for a new sign-in attempt
    ///
    /// Uses the caller's `state` when given, otherwise a random one. Either
    /// way the state is remembered for the callback.
    pub async fn authorization_url(&self, query: AuthorizeQuery) -> Result<String, SignInError> {
        let client_id = required(&self.settings.client_id, "oauth.client_id")?;
        let redirect_uri = required(&self.settings.redirect_uri, "oauth.redirect_uri")?;

        let scope = present(&query.scope).unwrap_or(self.settings.scope.as_str());
        let state = match present(&query.state) {
            Some(state) => state.to_string(),
            None => new_state(),
        };

        let mut params = vec![
            ("client_id", client_id),
            ("response_type", "code"),
            ("scope", scope),
            ("redirect_uri", redirect_uri),
            ("state", state.as_str()),
        ];
        for (key, value) in [
            ("given_names", &query.given_names),
            ("family_names", &query.family_names),
            ("email", &query.email),
            ("orcid", &query.orcid),
        ] {
            if let Some(value) = present(value) {
                params.push((key, value));
            }
        }

        let url = Url::parse_with_params(&self.authorize_endpoint, &params)
            .map_err(|_| SignInError::NotConfigured("a valid orcid.base_url"))?;

        self.remember_state(state.clone()).await;
        Ok(url.to_string())
    }

    /// Finish sign-in from the callback query
    ///
    /// On success the credential (with its access token) is in the store.
    pub async fn complete(&self, query: CallbackQuery) -> Result<StoredCredential, SignInError> {
        if let Some(error) = present(&query.error) {
            let description = present(&query.error_description).unwrap_or("Authorization failed");
            warn!(error = %error, description = %description, "ORCID authorization error");
            return Err(SignInError::Denied {
                error: error.to_string(),
                description: description.to_string(),
            });
        }

        let code = present(&query.code).ok_or(SignInError::MissingCode)?;

        let state = present(&query.state).ok_or(SignInError::InvalidState)?;
        if !self.take_state(state).await {
            warn!("OAuth callback with unknown or reused state");
            return Err(SignInError::InvalidState);
        }

        let grant = self
            .exchange
            .exchange_code(code)
            .await
            .map_err(|e| SignInError::ExchangeFailed(e.to_string()))?;

        let id = orcid_id::parse(&grant.orcid)
            .map_err(|e| SignInError::ExchangeFailed(e.to_string()))?;
        if grant.access_token.trim().is_empty() {
            return Err(SignInError::ExchangeFailed(
                "token response carried no access token".to_string(),
            ));
        }

        let credential = StoredCredential {
            orcid_id: id,
            access_token: Some(grant.access_token),
        };
        self.credentials.store(credential.clone()).await;

        info!(
            orcid_id = %credential.orcid_id,
            name = grant.name.as_deref().unwrap_or(""),
            "Signed in with ORCID"
        );
        Ok(credential)
    }

    /// Front-end page reporting a completed sign-in
    pub fn success_redirect(&self, credential: &StoredCredential) -> String {
        self.frontend_url("auth/success", &[("orcid_id", credential.orcid_id.as_str())])
    }

    /// Front-end page reporting a failed sign-in
    pub fn error_redirect(&self, err: &SignInError) -> String {
        match err {
            SignInError::Denied { error, description } => self.frontend_url(
                "auth/error",
                &[("error", error.as_str()), ("description", description.as_str())],
            ),
            other => self.frontend_url("auth/error", &[("error", other.code())]),
        }
    }

    pub fn status(&self) -> OAuthStatus {
        OAuthStatus {
            orcid_base_url: self.orcid_base_url.clone(),
            client_id_configured: present(&self.settings.client_id).is_some(),
            client_secret_configured: present(&self.settings.client_secret).is_some(),
            redirect_uri_configured: present(&self.settings.redirect_uri).is_some(),
            endpoints: OAuthEndpoints {
                authorize: "/oauth/authorize",
                callback: "/oauth/callback",
                status: "/oauth/status",
            },
        }
    }

    fn frontend_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = format!("{}/{}", self.settings.frontend_url.trim_end_matches('/'), path);
        match Url::parse_with_params(&base, params) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }

    async fn remember_state(&self, state: String) {
        let mut pending = self.pending_states.lock().await;
        pending.push_back(state);
        while pending.len() > MAX_PENDING_STATES {
            pending.pop_front();
        }
    }

    /// Consume `state` if it is outstanding
    async fn take_state(&self, state: &str) -> bool {
        let mut pending = self.pending_states.lock().await;
        match pending.iter().position(|s| s == state) {
            Some(index) => {
                pending.remove(index);
                true
            }
            None => false,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, SignInError> {
    present(value).ok_or(SignInError::NotConfigured(key))
}

fn new_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_shape() {
        let a = new_state();
        let b = new_state();

        assert_eq!(a.len(), STATE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_present_ignores_blank() {
        assert_eq!(present(&Some(" x ".to_string())), Some("x"));
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&None), None);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SignInError::MissingCode.code(), "no_code");
        assert_eq!(
            SignInError::ExchangeFailed("boom".to_string()).code(),
            "token_exchange_failed"
        );
        let denied = SignInError::Denied {
            error: "access_denied".to_string(),
            description: "User denied access".to_string(),
        };
        assert_eq!(denied.code(), "access_denied");
    }
}
