//! In-memory fakes for the external services

use async_trait::async_trait;
use orsync_common::config::{DebugConfig, OAuthConfig, TomlConfig};
use orsync_common::{orcid_id, Identity, ResearcherSummary};
use orsync_dashboard::services::{
    ProfileDirectory, ServiceError, SocialGraph, TokenExchange, TokenGrant,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn debug_config(enabled: bool) -> DebugConfig {
    DebugConfig {
        enabled,
        ..DebugConfig::default()
    }
}

/// Service config with a registered OAuth client
pub fn test_config(debug: bool) -> TomlConfig {
    TomlConfig {
        debug: debug_config(debug),
        oauth: OAuthConfig {
            client_id: Some("APP-TEST".to_string()),
            client_secret: Some("test-secret".to_string()),
            redirect_uri: Some("http://127.0.0.1:5780/oauth/callback".to_string()),
            ..OAuthConfig::default()
        },
        ..TomlConfig::default()
    }
}

pub fn summary(id: &str, name: &str, institution: &str) -> ResearcherSummary {
    ResearcherSummary {
        id: id.to_string(),
        name: Some(name.to_string()),
        institution: Some(institution.to_string()),
    }
}

/// Social-graph fake
#[derive(Default)]
pub struct FakeGraph {
    followed: Mutex<Vec<String>>,
    fetch_error: Mutex<Option<ServiceError>>,
    mutation_error: Mutex<Option<ServiceError>>,
    pub fetch_calls: AtomicUsize,
    pub follow_calls: AtomicUsize,
    pub unfollow_calls: AtomicUsize,
}

impl FakeGraph {
    pub fn following(ids: &[&str]) -> Self {
        let graph = Self::default();
        graph.set_followed(ids);
        graph
    }

    pub fn set_followed(&self, ids: &[&str]) {
        *self.followed.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
    }

    pub fn fail_fetch(&self, err: ServiceError) {
        *self.fetch_error.lock().unwrap() = Some(err);
    }

    pub fn fail_mutations(&self, err: Option<ServiceError>) {
        *self.mutation_error.lock().unwrap() = err;
    }

    pub fn mutation_calls(&self) -> usize {
        self.follow_calls.load(Ordering::SeqCst) + self.unfollow_calls.load(Ordering::SeqCst)
    }

    fn mutation_result(&self) -> Result<(), ServiceError> {
        match self.mutation_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SocialGraph for FakeGraph {
    async fn fetch_followed_ids(&self, _my_id: &str) -> Result<Vec<String>, ServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.followed.lock().unwrap().clone())
    }

    async fn request_follow(&self, _my_id: &str, target_id: &str) -> Result<(), ServiceError> {
        self.follow_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result()?;
        self.followed.lock().unwrap().push(target_id.to_string());
        Ok(())
    }

    async fn request_unfollow(&self, _my_id: &str, target_id: &str) -> Result<(), ServiceError> {
        self.unfollow_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result()?;
        self.followed.lock().unwrap().retain(|id| id != target_id);
        Ok(())
    }
}

/// Profile directory fake
#[derive(Default)]
pub struct FakeProfiles {
    identities: Mutex<HashMap<String, Identity>>,
    summaries: Mutex<Vec<ResearcherSummary>>,
    summary_error: Mutex<Option<ServiceError>>,
    pub identity_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
}

impl FakeProfiles {
    pub fn with_summaries(summaries: Vec<ResearcherSummary>) -> Self {
        let profiles = Self::default();
        *profiles.summaries.lock().unwrap() = summaries;
        profiles
    }

    pub fn add_identity(&self, id: &str, name: &str, affiliation: Option<&str>) {
        let identity = Identity {
            affiliation: affiliation.map(str::to_string),
            ..Identity::bare(id, name)
        };
        self.identities.lock().unwrap().insert(id.to_string(), identity);
    }

    pub fn fail_summaries(&self, err: ServiceError) {
        *self.summary_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl ProfileDirectory for FakeProfiles {
    async fn fetch_identity_by_id(&self, id: &str) -> Result<Identity, ServiceError> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        let id = orcid_id::clean(id).map_err(|e| ServiceError::NotFound(e.to_string()))?;
        self.identities
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ServiceError::NotFound(id))
    }

    async fn fetch_summaries_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<ResearcherSummary>, ServiceError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.summary_error.lock().unwrap().clone() {
            return Err(err);
        }
        // Newest first, like a search endpoint might order them
        let mut found: Vec<ResearcherSummary> = self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }
}

/// Token endpoint fake: every code maps to one researcher
pub struct FakeTokenExchange {
    orcid: Mutex<String>,
    error: Mutex<Option<ServiceError>>,
    pub codes: Mutex<Vec<String>>,
}

impl FakeTokenExchange {
    pub fn granting(orcid: &str) -> Self {
        Self {
            orcid: Mutex::new(orcid.to_string()),
            error: Mutex::new(None),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self, err: ServiceError) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn exchange_calls(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

impl Default for FakeTokenExchange {
    fn default() -> Self {
        Self::granting("0000-0002-1825-0097")
    }
}

#[async_trait]
impl TokenExchange for FakeTokenExchange {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ServiceError> {
        self.codes.lock().unwrap().push(code.to_string());
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(TokenGrant {
            access_token: format!("token-for-{}", code),
            orcid: self.orcid.lock().unwrap().clone(),
            name: Some("Josiah Carberry".to_string()),
            scope: Some("/authenticate".to_string()),
            expires_in: Some(631138518),
        })
    }
}
