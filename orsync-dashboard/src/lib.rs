//! orsync-dashboard library interface
//!
//! Identity resolution and following-list reconciliation for the OrSync
//! researcher dashboard, plus the JSON API the front end calls.

pub mod api;
pub mod error;
pub mod following;
pub mod identity;
pub mod services;
pub mod sign_in;

pub use crate::error::{ApiError, ApiResult, DashboardError, SignInError};

use axum::Router;
use chrono::{DateTime, Utc};
use orsync_common::config::TomlConfig;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::following::FollowingReconciler;
use crate::identity::IdentityResolver;
use crate::services::{CredentialStore, ProfileDirectory, SocialGraph, TokenExchange};
use crate::sign_in::SignInFlow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityResolver>,
    pub credentials: Arc<dyn CredentialStore>,
    pub following: Arc<FollowingReconciler>,
    pub sign_in: Arc<SignInFlow>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: &TomlConfig,
        credentials: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileDirectory>,
        graph: Arc<dyn SocialGraph>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Self {
        let identity =
            IdentityResolver::new(config.debug.clone(), credentials.clone(), profiles.clone());
        let following = FollowingReconciler::new(graph, profiles);
        let sign_in =
            SignInFlow::new(&config.orcid, config.oauth.clone(), exchange, credentials.clone());

        Self {
            identity: Arc::new(identity),
            credentials,
            following: Arc::new(following),
            sign_in: Arc::new(sign_in),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::session_routes())
        .merge(api::oauth_routes())
        .merge(api::following_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
