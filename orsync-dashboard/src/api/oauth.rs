//! ORCID sign-in endpoints
//!
//! - `GET /oauth/authorize` redirect to the ORCID authorization page
//! - `GET /oauth/callback`  ORCID redirect target; exchanges the code and
//!   redirects to the front end's `/auth/success` or `/auth/error`
//! - `GET /oauth/status`    which parts of the OAuth client are configured

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::sign_in::{AuthorizeQuery, CallbackQuery, OAuthStatus};
use crate::{ApiResult, AppState};

/// GET /oauth/authorize
///
/// **Errors:** 503 when the OAuth client id or redirect URI is not configured
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> ApiResult<Redirect> {
    let url = state.sign_in.authorization_url(query).await?;
    Ok(Redirect::to(&url))
}

/// GET /oauth/callback
///
/// Always answers with a redirect; failures are reported to the front end.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    match state.sign_in.complete(query).await {
        Ok(credential) => Redirect::to(&state.sign_in.success_redirect(&credential)),
        Err(e) => {
            error!(error = %e, "ORCID sign-in failed");
            Redirect::to(&state.sign_in.error_redirect(&e))
        }
    }
}

/// GET /oauth/status
pub async fn status(State(state): State<AppState>) -> Json<OAuthStatus> {
    Json(state.sign_in.status())
}

/// Build OAuth routes
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/authorize", get(authorize))
        .route("/oauth/callback", get(callback))
        .route("/oauth/status", get(status))
}
