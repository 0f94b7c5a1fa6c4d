//! Application settings.
//!
//! Values come from built-in defaults, then an optional `hublink.toml`, then
//! `HUBLINK__*` environment variables (`HUBLINK__SERVER__PORT=8080`).

use crate::resolver::ResolverConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration file looked up next to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hublink";
/// Environment variable prefix
pub const ENV_PREFIX: &str = "HUBLINK";

/// Settings error types
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub resolver: ResolverConfig,
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from `hublink.toml` and the environment
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from a named file (extension optional) and the environment
    pub fn load_from(path: &str) -> Result<Self, SettingsError> {
        let settings: Self = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Upper bound on a single request, resolution included
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 90,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Directory for daily rolling log files; stdout only when unset
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,hublink=debug".to_string(),
            format: LogFormat::Plain,
            directory: None,
            file_prefix: "hublink.log".to_string(),
        }
    }
}

/// API key gate settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuthConfig {
    /// When off, gated routes accept every request
    pub enabled: bool,
    #[validate(nested)]
    pub keys: Vec<ApiKeyEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keys: Vec::new(),
        }
    }
}

/// A configured API key
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiKeyEntry {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 8))]
    pub key: String,
    /// Requests allowed per process lifetime
    #[serde(default = "default_request_limit")]
    pub limit: u64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_request_limit() -> u64 {
    1000
}

fn default_active() -> bool {
    true
}
