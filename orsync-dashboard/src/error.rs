//! Error types for orsync-dashboard
//!
//! [`DashboardError`] is what the identity and following layers return.
//! [`ApiError`] wraps it for HTTP handlers and renders a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::ServiceError;

/// Failures surfaced by the identity resolver and the following reconciler
///
/// A batch summary that omits some IDs is not an error; those rows become
/// placeholders.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DashboardError {
    /// Profile service unreachable, or the ID is unknown to it
    #[error("Profile lookup failed for {id}: {reason}")]
    LookupFailure { id: String, reason: String },

    /// Mutation attempted without a session
    #[error("Not authenticated: sign in with ORCID first")]
    NotAuthenticated,

    /// Social-graph fetch or mutation failed
    #[error("{0}")]
    ServiceFailure(String),

    /// A newer load of the same view started before this one finished
    #[error("Superseded by a newer load")]
    Superseded,
}

impl DashboardError {
    pub fn lookup(id: &str, err: ServiceError) -> Self {
        DashboardError::LookupFailure {
            id: id.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<ServiceError> for DashboardError {
    fn from(err: ServiceError) -> Self {
        DashboardError::ServiceFailure(err.to_string())
    }
}

/// Failures of the ORCID sign-in flow
///
/// The callback reports these to the front end as a redirect; only
/// [`SignInError::NotConfigured`] reaches the caller as an HTTP error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignInError {
    /// ORCID returned an error instead of a code (user denied access, ...)
    #[error("ORCID authorization failed: {error}: {description}")]
    Denied { error: String, description: String },

    #[error("No authorization code received from ORCID")]
    MissingCode,

    /// `state` missing, never issued, or already used
    #[error("Unknown or reused OAuth state")]
    InvalidState,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("ORCID sign-in is not configured: {0} is missing")]
    NotConfigured(&'static str),
}

impl SignInError {
    /// Short code passed to the front end in the `error` query parameter
    pub fn code(&self) -> &str {
        match self {
            SignInError::Denied { error, .. } => error.as_str(),
            SignInError::MissingCode => "no_code",
            SignInError::InvalidState => "invalid_state",
            SignInError::ExchangeFailed(_) => "token_exchange_failed",
            SignInError::NotConfigured(_) => "not_configured",
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Core layer failure, status chosen per variant
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// Sign-in could not start
    #[error(transparent)]
    SignIn(#[from] SignInError),

    /// orsync-common error
    #[error("Common error: {0}")]
    Common(#[from] orsync_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Dashboard(ref err) => {
                let (status, code) = match err {
                    DashboardError::LookupFailure { .. } => (StatusCode::BAD_GATEWAY, "LOOKUP_FAILURE"),
                    DashboardError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
                    DashboardError::ServiceFailure(_) => (StatusCode::BAD_GATEWAY, "SERVICE_FAILURE"),
                    DashboardError::Superseded => (StatusCode::CONFLICT, "SUPERSEDED"),
                };
                (status, code, err.to_string())
            }
            ApiError::SignIn(ref err) => {
                let status = match err {
                    SignInError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, "SIGN_IN_FAILED", err.to_string())
            }
            ApiError::Common(orsync_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
