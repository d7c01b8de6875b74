//! Configuration loading for cubetime-server.
//!
//! Configuration is loaded from a TOML file (default: `cubetime-server.toml`).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for cubetime-server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// KV storage configuration.
    pub storage: StorageConfig,
    /// Bearer token authentication.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server (default: 127.0.0.1:8787).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Which KV backend holds user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database file.
    Sqlite,
    /// Process memory (lost on restart).
    Memory,
    /// No storage: every sync request answers "not configured".
    Disabled,
}

/// KV storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend (default: sqlite).
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
}

/// Bearer token authentication.
///
/// Maps each accepted token to the user id whose data it may access.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Token → user id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_database_path() -> PathBuf {
    PathBuf::from("cubetime.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: default_bind_address(),
            },
            storage: StorageConfig {
                backend: default_backend(),
                database: default_database_path(),
            },
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// User id for a bearer token, if the token is known.
    pub fn user_for_token(&self, token: &str) -> Option<&str> {
        self.auth.tokens.get(token).map(String::as_str)
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:8787");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
bind_address = "0.0.0.0:9000"

[storage]
backend = "memory"

[auth.tokens]
"secret-alice" = "alice"
"secret-bob" = "bob"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.user_for_token("secret-alice"), Some("alice"));
        assert_eq!(config.user_for_token("secret-bob"), Some("bob"));
        assert_eq!(config.user_for_token("nope"), None);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let toml = r#"
[server]
[storage]
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.database, PathBuf::from("cubetime.db"));
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn disabled_backend_parses() {
        let toml = r#"
[server]
[storage]
backend = "disabled"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Disabled);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = Config::from_file(std::path::Path::new("/nonexistent/cubetime.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
