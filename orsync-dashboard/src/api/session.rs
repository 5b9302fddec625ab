//! Session and identity endpoints
//!
//! - `GET    /api/session`  derived session state
//! - `DELETE /api/session`  sign out
//! - `GET    /api/identity` identity of the current session
//!
//! Sign-in itself goes through `/oauth/authorize` and `/oauth/callback`.

use axum::{extract::State, routing::get, Json, Router};
use orsync_common::Identity;
use tracing::info;

use crate::identity::SessionState;
use crate::{ApiResult, AppState};

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.identity.session().await)
}

/// DELETE /api/session
pub async fn sign_out(State(state): State<AppState>) -> Json<SessionState> {
    state.credentials.clear().await;
    info!("Signed out");
    Json(state.identity.session().await)
}

/// GET /api/identity
///
/// **Errors:** 502 when the profile lookup fails outside debug mode
pub async fn get_identity(State(state): State<AppState>) -> ApiResult<Json<Identity>> {
    let identity = state.identity.current_identity().await?;
    Ok(Json(identity))
}

/// Build session and identity routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session).delete(sign_out))
        .route("/api/identity", get(get_identity))
}
