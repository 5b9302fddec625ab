//! Bootstrap configuration loading
//!
//! Configuration is read once at startup from a TOML file. Every section and
//! every key is optional; anything missing falls back to a built-in default.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ORSYNC_CONFIG` environment variable
//! 3. `<user config dir>/orsync/config.toml`
//!
//! A missing file is not fatal (warning + defaults). A file that exists but
//! does not parse is a configuration error.

use crate::{orcid_id, Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ORSYNC_CONFIG";

/// Identifier used for the simulated session when debug mode is on
pub const DEFAULT_DEBUG_ORCID_ID: &str = "0000-0003-1574-0784";

/// Root of the TOML bootstrap file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub orcid: OrcidConfig,
    pub oauth: OAuthConfig,
    pub graph: GraphConfig,
    pub debug: DebugConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// ORCID registry settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrcidConfig {
    /// Registry base URL (`https://orcid.org` or `https://sandbox.orcid.org`)
    pub base_url: String,
    /// Read-public access token, sent as a bearer token when present
    pub access_token: Option<String>,
    /// Minimum spacing between requests to the public API
    pub min_request_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for OrcidConfig {
    fn default() -> Self {
        Self {
            base_url: "https://orcid.org".to_string(),
            access_token: None,
            min_request_interval_ms: 50,
            timeout_secs: 30,
        }
    }
}

impl OrcidConfig {
    /// Public API root matching the configured registry
    pub fn api_base_url(&self) -> &'static str {
        if self.base_url.contains("sandbox.orcid.org") {
            "https://pub.sandbox.orcid.org/v3.0"
        } else {
            "https://pub.orcid.org/v3.0"
        }
    }

    /// Page the browser is sent to for sign-in
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth/authorize", self.base_url.trim_end_matches('/'))
    }

    /// Endpoint that exchanges an authorization code for an access token
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url.trim_end_matches('/'))
    }
}

/// ORCID OAuth client registration
///
/// Sign-in is unavailable until `client_id`, `client_secret` and
/// `redirect_uri` are all set. The secret may also come from the
/// environment (see the `--client-secret` flag).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Must match the redirect URI registered with ORCID (`.../oauth/callback`)
    pub redirect_uri: Option<String>,
    /// Front end that receives the browser after the callback
    pub frontend_url: String,
    /// Scope requested when the caller does not name one
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            frontend_url: "http://localhost:8080".to_string(),
            scope: "/authenticate".to_string(),
        }
    }
}

/// Social-graph backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Debug mode: a fixed simulated identity replaces real authentication
///
/// Read once at startup and never changed while running.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub orcid_id: String,
    pub name: String,
    pub email: Option<String>,
    pub affiliation: Option<String>,
    pub location: Option<String>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            orcid_id: DEFAULT_DEBUG_ORCID_ID.to_string(),
            name: "Debug User".to_string(),
            email: Some("debug@example.com".to_string()),
            affiliation: Some("Debug University".to_string()),
            location: Some("Debug City, Debug Country".to_string()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !orcid_id::is_valid(&self.debug.orcid_id) {
            return Err(Error::Config(format!(
                "debug.orcid_id is not a valid ORCID iD: {}",
                self.debug.orcid_id
            )));
        }
        if self.oauth.frontend_url.trim().is_empty() {
            return Err(Error::Config("oauth.frontend_url cannot be empty".to_string()));
        }
        if self.graph.base_url.trim().is_empty() {
            return Err(Error::Config("graph.base_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Locates the bootstrap config file
pub struct ConfigPathResolver {
    cli_arg: Option<PathBuf>,
}

impl ConfigPathResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Resolve the config file path by priority
    ///
    /// Returns `None` only when no candidate location can be determined.
    /// The returned path may not exist.
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path()
    }
}

/// `<user config dir>/orsync/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("orsync").join("config.toml"))
}
