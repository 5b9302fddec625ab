//! Social-graph backend client
//!
//! REST endpoints, relative to the configured base URL:
//! - `GET    /api/researchers/{me}/following` → `{"following": ["id", ...]}`
//! - `POST   /api/researchers/{me}/following` with `{"orcid_id": "..."}`
//! - `DELETE /api/researchers/{me}/following/{target}`

use async_trait::async_trait;
use orsync_common::config::GraphConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ServiceError, SocialGraph};

#[derive(Debug, Deserialize)]
struct FollowingResponse {
    #[serde(default)]
    following: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FollowRequest<'a> {
    orcid_id: &'a str,
}

/// Social-graph API client
pub struct SocialGraphClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SocialGraphClient {
    pub fn new(config: &GraphConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn following_url(&self, my_id: &str) -> String {
        format!("{}/api/researchers/{}/following", self.base_url, my_id)
    }

    /// Map a non-success status to an error, keeping the body as the message
    async fn check(response: reqwest::Response, subject: &str) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }
        if status == 404 {
            return Err(ServiceError::NotFound(subject.to_string()));
        }
        if status == 429 {
            return Err(ServiceError::RateLimited);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(ServiceError::Api(status.as_u16(), error_text))
    }
}

#[async_trait]
impl SocialGraph for SocialGraphClient {
    async fn fetch_followed_ids(&self, my_id: &str) -> Result<Vec<String>, ServiceError> {
        let url = self.following_url(my_id);
        tracing::debug!(url = %url, "Fetching followed researchers");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let body: FollowingResponse = Self::check(response, my_id)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(body.following)
    }

    async fn request_follow(&self, my_id: &str, target_id: &str) -> Result<(), ServiceError> {
        let response = self
            .http_client
            .post(self.following_url(my_id))
            .json(&FollowRequest { orcid_id: target_id })
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Self::check(response, target_id).await?;
        tracing::info!(me = %my_id, target = %target_id, "Follow request accepted");
        Ok(())
    }

    async fn request_unfollow(&self, my_id: &str, target_id: &str) -> Result<(), ServiceError> {
        let url = format!("{}/{}", self.following_url(my_id), target_id);
        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Self::check(response, target_id).await?;
        tracing::info!(me = %my_id, target = %target_id, "Unfollow request accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_following_url_trims_trailing_slash() {
        let client = SocialGraphClient::new(&GraphConfig {
            base_url: "http://graph.local:8000/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            client.following_url("0000-0002-1825-0097"),
            "http://graph.local:8000/api/researchers/0000-0002-1825-0097/following"
        );
    }

    #[test]
    fn test_following_response_defaults_to_empty() {
        let body: FollowingResponse = serde_json::from_str("{}").unwrap();
        assert!(body.following.is_empty());

        let body: FollowingResponse =
            serde_json::from_str(r#"{"following": ["0000-1", "0000-2"]}"#).unwrap();
        assert_eq!(body.following, vec!["0000-1", "0000-2"]);
    }
}
