//! Configuration loading for score-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).

use score_core::ContestConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for score-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Snapshot storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Per-session limits.
    #[serde(default)]
    pub session: SessionConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Contest definition used to build the initial state.
    #[serde(default)]
    pub contest: ContestConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP/WebSocket listener (default: 0.0.0.0:8000).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Path of the WebSocket endpoint (default: /ws). Must start with `/` and
    /// must not shadow `/health` or `/metrics`.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path of the persisted state file (default: ./save).
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

/// Per-session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Outbound queue capacity per session (default: 256).
    /// A session whose queue overflows is disconnected so it can resync.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
    /// Largest inbound frame accepted, in bytes (default: 1MB).
    /// This is a transport limit: a larger frame fails the WebSocket read and
    /// closes the session, unlike malformed frames which are only dropped.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Enable metrics endpoint (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("save")
}

fn default_send_queue() -> usize {
    256
}

fn default_max_message_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            ws_path: default_ws_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_queue: default_send_queue(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a value
    /// is rejected by [`Config::validate`].
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail when the router is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ws_path = self.server.ws_path.as_str();
        if !ws_path.starts_with('/') || ws_path.len() < 2 {
            return Err(ConfigError::Invalid {
                field: "server.ws_path",
                reason: format!("{:?} must start with '/' and name a path", ws_path),
            });
        }
        if ws_path == "/health" || ws_path == "/metrics" {
            return Err(ConfigError::Invalid {
                field: "server.ws_path",
                reason: format!("{} is reserved", ws_path),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A configuration value is not usable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted name of the field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
