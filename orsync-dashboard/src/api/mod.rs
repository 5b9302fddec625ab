//! HTTP API handlers for orsync-dashboard

pub mod following;
pub mod health;
pub mod oauth;
pub mod session;

pub use following::following_routes;
pub use health::health_routes;
pub use oauth::oauth_routes;
pub use session::session_routes;
