//! Following endpoints
//!
//! - `GET    /api/following`             load and return the following view
//! - `POST   /api/following/:target_id`  follow (optional body `{"name": "..."}`)
//! - `DELETE /api/following/:target_id`  unfollow

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use orsync_common::orcid_id;
use serde::Deserialize;

use crate::following::{FollowPrompt, FollowingView, LoadState};
use crate::{ApiResult, AppState};

/// Optional payload for a follow request
#[derive(Debug, Default, Deserialize)]
pub struct FollowRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// GET /api/following
///
/// **Errors:** 502 when the graph or profile service fails, 409 when a newer
/// load replaced this one
pub async fn get_following(State(state): State<AppState>) -> ApiResult<Json<FollowingView>> {
    let session = state.identity.session().await;
    let entries = state.following.load_following(&session.effective_id).await?;

    Ok(Json(FollowingView {
        state: LoadState::Loaded,
        entries,
    }))
}

/// POST /api/following/:target_id
///
/// **Errors:** 400 malformed ORCID iD, 401 signed out, 502 graph failure
pub async fn follow(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    payload: Option<Json<FollowRequest>>,
) -> ApiResult<Json<FollowPrompt>> {
    let target_id = orcid_id::parse(&target_id)?;
    let name = payload
        .and_then(|Json(body)| body.name)
        .unwrap_or_else(|| target_id.clone());

    let acting_id = state.identity.acting_identifier().await;
    let mut prompt = FollowPrompt::open(target_id, name);
    prompt.submit(&state.following, acting_id.as_deref()).await?;

    Ok(Json(prompt))
}

/// DELETE /api/following/:target_id
///
/// Returns the view after removal.
///
/// **Errors:** 401 signed out, 502 graph failure (view unchanged)
pub async fn unfollow(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
) -> ApiResult<Json<FollowingView>> {
    let target_id = orcid_id::clean(&target_id)?;

    let acting_id = state.identity.acting_identifier().await;
    state
        .following
        .unfollow(acting_id.as_deref(), &target_id)
        .await?;

    Ok(Json(state.following.snapshot().await))
}

/// Build following routes
pub fn following_routes() -> Router<AppState> {
    Router::new()
        .route("/api/following", get(get_following))
        .route("/api/following/:target_id", post(follow).delete(unfollow))
}
