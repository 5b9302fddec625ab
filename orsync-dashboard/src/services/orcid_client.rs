//! ORCID public API client
//!
//! Identity lookups read three record sections (personal details, emails,
//! employments). Only personal details are required; the other two degrade
//! to `None` when they cannot be read. Batch summaries come from a single
//! expanded-search query.

use async_trait::async_trait;
use orsync_common::config::OrcidConfig;
use orsync_common::{orcid_id, Identity, ResearcherSummary};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{ProfileDirectory, ServiceError};

const USER_AGENT: &str = concat!("OrSync/", env!("CARGO_PKG_VERSION"));
/// Upper bound ORCID accepts for `rows` on search endpoints
const MAX_SEARCH_ROWS: usize = 1000;
const NAME_NOT_AVAILABLE: &str = "Name not available";

#[derive(Debug, Default, Deserialize)]
struct ValueField {
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonalDetails {
    name: Option<NameSection>,
}

#[derive(Debug, Default, Deserialize)]
struct NameSection {
    #[serde(rename = "given-names")]
    given_names: Option<ValueField>,
    #[serde(rename = "family-name")]
    family_name: Option<ValueField>,
    #[serde(rename = "credit-name")]
    credit_name: Option<ValueField>,
}

#[derive(Debug, Default, Deserialize)]
struct Emails {
    #[serde(default)]
    email: Vec<EmailEntry>,
}

#[derive(Debug, Deserialize)]
struct EmailEntry {
    email: Option<String>,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Employments {
    #[serde(rename = "affiliation-group", default)]
    affiliation_group: Vec<AffiliationGroup>,
}

#[derive(Debug, Deserialize)]
struct AffiliationGroup {
    #[serde(default)]
    summaries: Vec<EmploymentWrapper>,
}

#[derive(Debug, Deserialize)]
struct EmploymentWrapper {
    #[serde(rename = "employment-summary")]
    employment_summary: Option<EmploymentSummary>,
}

#[derive(Debug, Deserialize)]
struct EmploymentSummary {
    #[serde(rename = "end-date")]
    end_date: Option<serde_json::Value>,
    organization: Option<Organization>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    name: Option<String>,
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExpandedSearch {
    #[serde(rename = "expanded-result")]
    expanded_result: Option<Vec<ExpandedResult>>,
}

#[derive(Debug, Deserialize)]
struct ExpandedResult {
    #[serde(rename = "orcid-id")]
    orcid_id: String,
    #[serde(rename = "given-names")]
    given_names: Option<String>,
    #[serde(rename = "family-names")]
    family_names: Option<String>,
    #[serde(rename = "credit-name")]
    credit_name: Option<String>,
    #[serde(rename = "institution-name", default)]
    institution_name: Vec<String>,
}

/// Spaces requests by a minimum interval
///
/// Each caller reserves the next free slot under the lock, then sleeps until
/// that slot without holding it, so concurrent lookups queue up one interval
/// apart instead of serializing on the mutex.
struct RateLimiter {
    next_slot: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            next_slot: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Reserve a slot and return when it is due
    fn reserve(&self, next_slot: &mut Option<Instant>) -> Instant {
        let now = Instant::now();
        let slot = match *next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        *next_slot = Some(slot + self.min_interval);
        slot
    }

    async fn wait(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            self.reserve(&mut next_slot)
        };

        let delay = slot.saturating_duration_since(Instant::now());
        if !delay.is_zero() {
            tracing::debug!("Rate limiting: waiting {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// ORCID public API client
pub struct OrcidClient {
    http_client: reqwest::Client,
    api_base_url: String,
    access_token: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl OrcidClient {
    pub fn new(config: &OrcidConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url().to_string(),
            access_token: config.access_token.clone(),
            rate_limiter: Arc::new(RateLimiter::new(config.min_request_interval_ms)),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, ServiceError> {
        self.rate_limiter.wait().await;

        tracing::debug!(url = %url, "Querying ORCID API");

        let mut request = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(ServiceError::NotFound(subject.to_string()));
        }

        if status == 429 || status == 503 {
            return Err(ServiceError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))
    }

    async fn record_section<T: DeserializeOwned>(
        &self,
        id: &str,
        section: &str,
    ) -> Result<T, ServiceError> {
        let url = format!("{}/{}/{}", self.api_base_url, id, section);
        self.get_json(&url, &[], id).await
    }
}

#[async_trait]
impl ProfileDirectory for OrcidClient {
    async fn fetch_identity_by_id(&self, id: &str) -> Result<Identity, ServiceError> {
        let id = orcid_id::parse(id).map_err(|e| ServiceError::NotFound(e.to_string()))?;

        let details: PersonalDetails = self.record_section(&id, "personal-details").await?;

        let email = match self.record_section::<Emails>(&id, "email").await {
            Ok(emails) => primary_email(&emails),
            Err(e) => {
                tracing::warn!(orcid_id = %id, error = %e, "Could not read ORCID emails");
                None
            }
        };

        let (affiliation, location) = match self.record_section::<Employments>(&id, "employments").await {
            Ok(employments) => current_employment(&employments),
            Err(e) => {
                tracing::warn!(orcid_id = %id, error = %e, "Could not read ORCID employments");
                (None, None)
            }
        };

        let identity = Identity {
            profile_url: orcid_id::profile_url(&id),
            display_name: display_name(&details),
            id,
            email,
            affiliation,
            location,
            authenticated: false,
        };

        tracing::info!(
            orcid_id = %identity.id,
            name = %identity.display_name,
            "Retrieved identity from ORCID"
        );

        Ok(identity)
    }

    async fn fetch_summaries_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<ResearcherSummary>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_SEARCH_ROWS {
            tracing::warn!(
                requested = ids.len(),
                "More IDs than one ORCID search returns; the rest become placeholders"
            );
        }

        let url = format!("{}/expanded-search/", self.api_base_url);
        let query = [
            ("q", summary_query(ids)),
            ("rows", ids.len().min(MAX_SEARCH_ROWS).to_string()),
        ];

        let search: ExpandedSearch = self.get_json(&url, &query, "expanded-search").await?;
        let summaries: Vec<ResearcherSummary> = search
            .expanded_result
            .unwrap_or_default()
            .into_iter()
            .map(summary_from_result)
            .collect();

        tracing::debug!(
            requested = ids.len(),
            returned = summaries.len(),
            "Fetched researcher summaries"
        );

        Ok(summaries)
    }
}

/// `orcid:(A OR B OR ...)`
fn summary_query(ids: &[String]) -> String {
    format!("orcid:({})", ids.join(" OR "))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn join_name(given: Option<&str>, family: Option<&str>) -> Option<String> {
    let full = format!("{} {}", given.unwrap_or(""), family.unwrap_or(""));
    non_blank(Some(&full))
}

fn field_value(field: &Option<ValueField>) -> Option<&str> {
    field.as_ref().and_then(|f| f.value.as_deref())
}

/// Credit name when present, otherwise given + family names
fn display_name(details: &PersonalDetails) -> String {
    let Some(name) = &details.name else {
        return NAME_NOT_AVAILABLE.to_string();
    };

    non_blank(field_value(&name.credit_name))
        .or_else(|| join_name(field_value(&name.given_names), field_value(&name.family_name)))
        .unwrap_or_else(|| NAME_NOT_AVAILABLE.to_string())
}

/// Primary address, else the first one listed
fn primary_email(emails: &Emails) -> Option<String> {
    emails
        .email
        .iter()
        .find(|e| e.primary)
        .or_else(|| emails.email.first())
        .and_then(|e| e.email.clone())
}

/// Organization and location of the first employment without an end date
fn current_employment(employments: &Employments) -> (Option<String>, Option<String>) {
    let current = employments
        .affiliation_group
        .iter()
        .flat_map(|group| group.summaries.iter())
        .filter_map(|wrapper| wrapper.employment_summary.as_ref())
        .filter(|summary| summary.end_date.as_ref().map_or(true, |d| d.is_null()))
        .find_map(|summary| summary.organization.as_ref());

    let Some(organization) = current else {
        return (None, None);
    };

    let location = organization.address.as_ref().and_then(|address| {
        let parts: Vec<&str> = [&address.city, &address.region, &address.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    });

    (organization.name.clone(), location)
}

fn summary_from_result(result: ExpandedResult) -> ResearcherSummary {
    let name = non_blank(result.credit_name.as_deref())
        .or_else(|| join_name(result.given_names.as_deref(), result.family_names.as_deref()));

    ResearcherSummary {
        id: orcid_id::clean(&result.orcid_id).unwrap_or(result.orcid_id),
        name,
        institution: result.institution_name.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_prefers_credit_name() {
        let details: PersonalDetails = serde_json::from_value(json!({
            "name": {
                "given-names": {"value": "Josiah"},
                "family-name": {"value": "Carberry"},
                "credit-name": {"value": "J. S. Carberry"}
            }
        }))
        .unwrap();

        assert_eq!(display_name(&details), "J. S. Carberry");
    }

    #[test]
    fn test_display_name_joins_given_and_family() {
        let details: PersonalDetails = serde_json::from_value(json!({
            "name": {
                "given-names": {"value": "Josiah"},
                "family-name": null,
                "credit-name": null
            }
        }))
        .unwrap();

        assert_eq!(display_name(&details), "Josiah");
    }

    #[test]
    fn test_display_name_fallback() {
        let details: PersonalDetails = serde_json::from_value(json!({"name": null})).unwrap();
        assert_eq!(display_name(&details), NAME_NOT_AVAILABLE);
    }

    #[test]
    fn test_primary_email_selection() {
        let emails: Emails = serde_json::from_value(json!({
            "email": [
                {"email": "old@example.org", "primary": false},
                {"email": "main@example.org", "primary": true}
            ]
        }))
        .unwrap();
        assert_eq!(primary_email(&emails), Some("main@example.org".to_string()));

        let emails: Emails = serde_json::from_value(json!({
            "email": [{"email": "only@example.org", "primary": false}]
        }))
        .unwrap();
        assert_eq!(primary_email(&emails), Some("only@example.org".to_string()));

        assert_eq!(primary_email(&Emails::default()), None);
    }

    #[test]
    fn test_current_employment_skips_ended_positions() {
        let employments: Employments = serde_json::from_value(json!({
            "affiliation-group": [
                {"summaries": [{"employment-summary": {
                    "end-date": {"year": {"value": "2019"}},
                    "organization": {"name": "Old Lab", "address": {"city": "Lisbon"}}
                }}]},
                {"summaries": [{"employment-summary": {
                    "end-date": null,
                    "organization": {
                        "name": "Brown University",
                        "address": {"city": "Providence", "region": "RI", "country": "US"}
                    }
                }}]}
            ]
        }))
        .unwrap();

        let (affiliation, location) = current_employment(&employments);
        assert_eq!(affiliation, Some("Brown University".to_string()));
        assert_eq!(location, Some("Providence, RI, US".to_string()));
    }

    #[test]
    fn test_current_employment_none() {
        assert_eq!(current_employment(&Employments::default()), (None, None));
    }

    #[test]
    fn test_summary_from_expanded_result() {
        let search: ExpandedSearch = serde_json::from_value(json!({
            "expanded-result": [{
                "orcid-id": "0000-0002-1825-0097",
                "given-names": "Josiah",
                "family-names": "Carberry",
                "credit-name": null,
                "institution-name": ["Brown University", "Wesleyan University"]
            }],
            "num-found": 1
        }))
        .unwrap();

        let summary = summary_from_result(search.expanded_result.unwrap().remove(0));
        assert_eq!(summary.id, "0000-0002-1825-0097");
        assert_eq!(summary.name, Some("Josiah Carberry".to_string()));
        assert_eq!(summary.institution, Some("Brown University".to_string()));
    }

    #[test]
    fn test_empty_search_result() {
        let search: ExpandedSearch =
            serde_json::from_value(json!({"expanded-result": null, "num-found": 0})).unwrap();
        assert!(search.expanded_result.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_summary_query() {
        let ids = vec!["0000-0001".to_string(), "0000-0002".to_string()];
        assert_eq!(summary_query(&ids), "orcid:(0000-0001 OR 0000-0002)");
    }

    #[test]
    fn test_client_creation() {
        let client = OrcidClient::new(&OrcidConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let client = OrcidClient::new(&OrcidConfig::default()).unwrap();
        let summaries = client.fetch_summaries_by_ids(&[]).await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }

    #[test]
    fn test_rate_limiter_reserves_consecutive_slots() {
        let limiter = RateLimiter::new(100);
        let mut next_slot = None;

        let first = limiter.reserve(&mut next_slot);
        let second = limiter.reserve(&mut next_slot);
        let third = limiter.reserve(&mut next_slot);

        assert_eq!(second - first, Duration::from_millis(100));
        assert_eq!(third - second, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_rate_limiter_concurrent_callers_are_spaced() {
        let limiter = Arc::new(RateLimiter::new(100));
        let start = Instant::now();

        let waits: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait().await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for wait in waits {
            finished.push(wait.await.unwrap().duration_since(start));
        }
        finished.sort();

        assert!(finished[0] < Duration::from_millis(80));
        assert!(finished[2] >= Duration::from_millis(180));
    }
}
