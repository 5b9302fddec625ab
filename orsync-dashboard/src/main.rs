//! orsync-dashboard - researcher dashboard backend
//!
//! Serves identity and following data to the OrSync front end. Profile data
//! comes from the ORCID public API; follow relationships from the
//! social-graph backend.

use anyhow::{Context, Result};
use clap::Parser;
use orsync_common::config::{ConfigPathResolver, TomlConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orsync_dashboard::services::{
    InMemoryCredentialStore, OrcidClient, OrcidOAuthClient, SocialGraphClient,
};
use orsync_dashboard::{build_router, AppState};

/// Command-line arguments for orsync-dashboard
#[derive(Parser, Debug)]
#[command(name = "orsync-dashboard")]
#[command(about = "Researcher dashboard backend for OrSync")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "ORSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "ORSYNC_PORT")]
    port: Option<u16>,

    /// Run with the simulated debug identity (overrides config)
    #[arg(long, env = "ORSYNC_DEBUG")]
    debug: bool,

    /// ORCID OAuth client secret (overrides config)
    #[arg(long, env = "ORCID_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = ConfigPathResolver::new(args.config.clone()).resolve();
    let mut config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.debug {
        config.debug.enabled = true;
    }
    if let Some(secret) = args.client_secret {
        config.oauth.client_secret = Some(secret);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("orsync_dashboard={0},orsync_common={0},tower_http={0}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting orsync-dashboard v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        _ => info!("Configuration: built-in defaults"),
    }
    info!("ORCID API: {}", config.orcid.api_base_url());
    info!("Social graph: {}", config.graph.base_url);
    info!("ORCID sign-in: {}", config.orcid.authorize_endpoint());

    let profiles = Arc::new(
        OrcidClient::new(&config.orcid).context("Failed to create ORCID client")?,
    );
    let graph = Arc::new(
        SocialGraphClient::new(&config.graph).context("Failed to create social-graph client")?,
    );
    let exchange = Arc::new(
        OrcidOAuthClient::new(&config.orcid, &config.oauth)
            .context("Failed to create ORCID OAuth client")?,
    );
    let credentials = Arc::new(InMemoryCredentialStore::new());

    let state = AppState::new(&config, credentials, profiles, graph, exchange);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
