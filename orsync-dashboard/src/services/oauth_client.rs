//! ORCID OAuth token client
//!
//! Exchanges the authorization code handed to `/oauth/callback` for an access
//! token and the researcher's ORCID iD (`POST {registry}/oauth/token`).

use async_trait::async_trait;
use orsync_common::config::{OAuthConfig, OrcidConfig};
use std::time::Duration;

use super::{ServiceError, TokenExchange, TokenGrant};

const USER_AGENT: &str = concat!("OrSync/", env!("CARGO_PKG_VERSION"));

/// Registered client credentials; all three are needed for an exchange
struct ClientRegistration {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl ClientRegistration {
    fn from_config(oauth: &OAuthConfig) -> Option<Self> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            client_id: present(&oauth.client_id)?,
            client_secret: present(&oauth.client_secret)?,
            redirect_uri: present(&oauth.redirect_uri)?,
        })
    }
}

/// Token endpoint client
pub struct OrcidOAuthClient {
    http_client: reqwest::Client,
    token_endpoint: String,
    registration: Option<ClientRegistration>,
}

impl OrcidOAuthClient {
    pub fn new(orcid: &OrcidConfig, oauth: &OAuthConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(orcid.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let registration = ClientRegistration::from_config(oauth);
        if registration.is_none() {
            tracing::warn!("ORCID OAuth client not fully configured; sign-in is disabled");
        }

        Ok(Self {
            http_client,
            token_endpoint: orcid.token_endpoint(),
            registration,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.registration.is_some()
    }
}

#[async_trait]
impl TokenExchange for OrcidOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ServiceError> {
        let registration = self.registration.as_ref().ok_or_else(|| {
            ServiceError::NotConfigured(
                "oauth.client_id, oauth.client_secret and oauth.redirect_uri are required"
                    .to_string(),
            )
        })?;

        tracing::debug!(url = %self.token_endpoint, "Exchanging ORCID authorization code");

        let form = [
            ("client_id", registration.client_id.as_str()),
            ("client_secret", registration.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", registration.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form[..])
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();

        if status == 429 || status == 503 {
            return Err(ServiceError::RateLimited);
        }

        if !status.is_success() {
            // ORCID answers a bad or reused code with 400 `invalid_grant`
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(status.as_u16(), error_text));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        tracing::info!(
            orcid_id = %grant.orcid,
            scope = grant.scope.as_deref().unwrap_or(""),
            "ORCID token exchange succeeded"
        );

        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> OAuthConfig {
        OAuthConfig {
            client_id: Some("APP-1234".to_string()),
            client_secret: Some("secret".to_string()),
            redirect_uri: Some("http://127.0.0.1:5780/oauth/callback".to_string()),
            ..OAuthConfig::default()
        }
    }

    #[test]
    fn test_registration_requires_all_fields() {
        assert!(ClientRegistration::from_config(&registered()).is_some());

        let missing_secret = OAuthConfig {
            client_secret: Some("  ".to_string()),
            ..registered()
        };
        assert!(ClientRegistration::from_config(&missing_secret).is_none());
        assert!(ClientRegistration::from_config(&OAuthConfig::default()).is_none());
    }

    #[test]
    fn test_token_endpoint_from_registry() {
        let orcid = OrcidConfig {
            base_url: "https://sandbox.orcid.org".to_string(),
            ..OrcidConfig::default()
        };
        let client = OrcidOAuthClient::new(&orcid, &registered()).unwrap();

        assert!(client.is_configured());
        assert_eq!(client.token_endpoint, "https://sandbox.orcid.org/oauth/token");
    }

    #[tokio::test]
    async fn test_unconfigured_client_makes_no_request() {
        let client = OrcidOAuthClient::new(&OrcidConfig::default(), &OAuthConfig::default()).unwrap();

        let result = client.exchange_code("abc123").await;
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }

    #[test]
    fn test_token_response_parsing() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{
                "access_token": "f5af9f51-07e6-4332-8f1a-c0c11c1e3728",
                "token_type": "bearer",
                "refresh_token": "f725f747-3a65-49f6-a231-3e8944ce464d",
                "expires_in": 631138518,
                "scope": "/authenticate",
                "name": "Sofia Garcia",
                "orcid": "0000-0001-2345-6789"
            }"#,
        )
        .unwrap();

        assert_eq!(grant.orcid, "0000-0001-2345-6789");
        assert_eq!(grant.name.as_deref(), Some("Sofia Garcia"));
        assert_eq!(grant.expires_in, Some(631138518));
        assert!(!format!("{:?}", grant).contains("f5af9f51"));
    }
}
