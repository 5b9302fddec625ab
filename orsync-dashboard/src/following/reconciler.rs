//! Following-list reconciler
//!
//! Owns the following view for one dashboard session. A load walks
//! `Idle → Loading → {Loaded, Failed}`:
//! 1. fetch followed IDs (an empty list ends the cycle, no summary request)
//! 2. batch-fetch summaries for all of them in one request
//! 3. merge, with placeholders for IDs the summary response left out
//!
//! Any fetch failure empties the list and records the message; partial data
//! is never shown next to an error.
//!
//! A new load supersedes one still in flight. Each load takes a generation
//! number and only the newest generation may write the view. Writes happen
//! under a single lock, so a [`FollowingReconciler::snapshot`] never sees an
//! intermediate list.
//!
//! An unfollow confirmed while a load is in flight is remembered and applied
//! when that load commits; the load may have fetched the ID list before the
//! server dropped the target.

use orsync_common::FollowEntry;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::merge::reconcile;
use crate::error::DashboardError;
use crate::services::{ProfileDirectory, SocialGraph};

/// Load cycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Consistent copy of the view for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowingView {
    pub state: LoadState,
    pub entries: Vec<FollowEntry>,
}

impl Default for FollowingView {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            entries: Vec::new(),
        }
    }
}

#[derive(Default)]
struct ViewState {
    current: FollowingView,
    /// Targets unfollowed since the in-flight load started
    unfollowed_during_load: HashSet<String>,
}

/// Reconciles the followed-ID list with profile summaries
pub struct FollowingReconciler {
    graph: Arc<dyn SocialGraph>,
    profiles: Arc<dyn ProfileDirectory>,
    view: RwLock<ViewState>,
    generation: AtomicU64,
}

impl FollowingReconciler {
    pub fn new(graph: Arc<dyn SocialGraph>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self {
            graph,
            profiles,
            view: RwLock::new(ViewState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> FollowingView {
        self.view.read().await.current.clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Load the following view for `my_id`
    ///
    /// Returns the reconciled list, one entry per followed ID. If a newer
    /// load started meanwhile, the result is discarded and
    /// [`DashboardError::Superseded`] is returned.
    pub async fn load_following(&self, my_id: &str) -> Result<Vec<FollowEntry>, DashboardError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut view = self.view.write().await;
            if self.is_current(generation) {
                view.current.state = LoadState::Loading;
                view.unfollowed_during_load.clear();
            }
        }

        let outcome = self.fetch_and_reconcile(my_id).await;

        let mut view = self.view.write().await;
        if !self.is_current(generation) {
            debug!(generation, "Discarding result of superseded following load");
            return Err(DashboardError::Superseded);
        }

        let unfollowed = std::mem::take(&mut view.unfollowed_during_load);
        match outcome {
            Ok(mut entries) => {
                if !unfollowed.is_empty() {
                    entries.retain(|entry| !unfollowed.contains(&entry.researcher_id));
                }
                info!(
                    me = %my_id,
                    count = entries.len(),
                    "Following list loaded"
                );
                view.current = FollowingView {
                    state: LoadState::Loaded,
                    entries: entries.clone(),
                };
                Ok(entries)
            }
            Err(e) => {
                warn!(me = %my_id, error = %e, "Following list failed to load");
                view.current = FollowingView {
                    state: LoadState::Failed(e.to_string()),
                    entries: Vec::new(),
                };
                Err(e)
            }
        }
    }

    async fn fetch_and_reconcile(&self, my_id: &str) -> Result<Vec<FollowEntry>, DashboardError> {
        let ids = self.graph.fetch_followed_ids(my_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summaries = self
            .profiles
            .fetch_summaries_by_ids(&ids)
            .await
            .map_err(|e| DashboardError::LookupFailure {
                id: format!("{} researchers followed by {}", ids.len(), my_id),
                reason: e.to_string(),
            })?;

        Ok(reconcile(&ids, summaries))
    }

    /// Ask the graph service to follow `target_id`
    ///
    /// Local state is not touched; callers reload after success.
    pub async fn follow(&self, my_id: Option<&str>, target_id: &str) -> Result<(), DashboardError> {
        let my_id = require_session(my_id)?;
        self.graph.request_follow(my_id, target_id).await?;
        Ok(())
    }

    /// Unfollow `target_id` and drop it from the view once confirmed
    ///
    /// Removing an ID that is not in the view is not an error. On failure
    /// the view is left as it was.
    pub async fn unfollow(&self, my_id: Option<&str>, target_id: &str) -> Result<(), DashboardError> {
        let my_id = require_session(my_id)?;
        self.graph.request_unfollow(my_id, target_id).await?;

        let mut view = self.view.write().await;
        if view.current.state == LoadState::Loading {
            view.unfollowed_during_load.insert(target_id.to_string());
        }
        let before = view.current.entries.len();
        view.current.entries.retain(|entry| entry.researcher_id != target_id);
        debug!(
            target = %target_id,
            removed = before - view.current.entries.len(),
            "Applied unfollow to view"
        );
        Ok(())
    }
}

fn require_session(my_id: Option<&str>) -> Result<&str, DashboardError> {
    match my_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(DashboardError::NotAuthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_session() {
        assert_eq!(require_session(Some("0000-1")), Ok("0000-1"));
        assert_eq!(require_session(Some("")), Err(DashboardError::NotAuthenticated));
        assert_eq!(require_session(None), Err(DashboardError::NotAuthenticated));
    }

    #[test]
    fn test_load_state_serialization() {
        let failed = serde_json::to_value(LoadState::Failed("boom".to_string())).unwrap();
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["message"], "boom");

        let loaded = serde_json::to_value(LoadState::Loaded).unwrap();
        assert_eq!(loaded["status"], "loaded");
    }
}
