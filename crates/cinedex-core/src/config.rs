//! Cinedex Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Token signing and session lifetimes
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = parse_value("API_PORT", port)?;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Store
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            config.database.backend = backend.parse()?;
        }
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            config.database.surrealdb_url = url;
        }
        if let Ok(user) = std::env::var("SURREALDB_USER") {
            config.database.surrealdb_user = user;
        }
        if let Ok(pass) = std::env::var("SURREALDB_PASS") {
            config.database.surrealdb_pass = pass;
        }
        if let Ok(ns) = std::env::var("SURREALDB_NAMESPACE") {
            config.database.surrealdb_namespace = ns;
        }
        if let Ok(db) = std::env::var("SURREALDB_DATABASE") {
            config.database.surrealdb_database = db;
        }
        if let Ok(secs) = std::env::var("STORE_TIMEOUT_SECS") {
            config.database.timeout_secs = parse_value("STORE_TIMEOUT_SECS", secs)?;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(hours) = std::env::var("JWT_ACCESS_TTL_HOURS") {
            config.auth.access_ttl_hours = parse_value("JWT_ACCESS_TTL_HOURS", hours)?;
        }
        if let Ok(hours) = std::env::var("JWT_REFRESH_TTL_HOURS") {
            config.auth.refresh_ttl_hours = parse_value("JWT_REFRESH_TTL_HOURS", hours)?;
        }
        if let Ok(secs) = std::env::var("REFRESH_TIMEOUT_SECS") {
            config.auth.refresh_timeout_secs = parse_value("REFRESH_TIMEOUT_SECS", secs)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        // Only override if env values differ from defaults
        if env_config.server.host != ServerConfig::default().host {
            self.server.host = env_config.server.host;
        }
        if env_config.server.port != ServerConfig::default().port {
            self.server.port = env_config.server.port;
        }
        if env_config.database.backend != StoreBackend::default() {
            self.database.backend = env_config.database.backend;
        }

        // Always use env for secrets
        if std::env::var("JWT_SECRET").is_ok() {
            self.auth.jwt_secret = env_config.auth.jwt_secret;
        }
        if std::env::var("SURREALDB_PASS").is_ok() {
            self.database.surrealdb_pass = env_config.database.surrealdb_pass;
        }

        Ok(self)
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        check_ttl("JWT_ACCESS_TTL_HOURS", self.auth.access_ttl_hours)?;
        check_ttl("JWT_REFRESH_TTL_HOURS", self.auth.refresh_ttl_hours)?;
        Ok(())
    }
}

/// Longest accepted token lifetime (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

fn check_ttl(key: &str, hours: i64) -> Result<(), ConfigError> {
    if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        key: key.to_string(),
        value: hours.to_string(),
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_enabled: true,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Which document store implementation to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Surreal,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "surreal" | "surrealdb" => Ok(Self::Surreal),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "STORE_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Document store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store implementation
    pub backend: StoreBackend,

    /// SurrealDB WebSocket URL
    pub surrealdb_url: String,

    /// SurrealDB username
    pub surrealdb_user: String,

    /// SurrealDB password
    pub surrealdb_pass: String,

    /// SurrealDB namespace
    pub surrealdb_namespace: String,

    /// SurrealDB database name
    pub surrealdb_database: String,

    /// Deadline for a single store operation, in seconds
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Surreal,
            surrealdb_url: "ws://localhost:8001".to_string(),
            surrealdb_user: "root".to_string(),
            surrealdb_pass: "root".to_string(),
            surrealdb_namespace: "cinedex".to_string(),
            surrealdb_database: "catalog".to_string(),
            timeout_secs: 100,
        }
    }
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for token signing
    pub jwt_secret: String,

    /// Access token lifetime in hours
    pub access_ttl_hours: i64,

    /// Refresh token lifetime in hours
    pub refresh_ttl_hours: i64,

    /// Deadline for persisting a refreshed token pair, in seconds
    pub refresh_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_ttl_hours: 12,
            refresh_ttl_hours: 100,
            refresh_timeout_secs: 10,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_hours", &self.access_ttl_hours)
            .field("refresh_ttl_hours", &self.refresh_ttl_hours)
            .field("refresh_timeout_secs", &self.refresh_timeout_secs)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.timeout_secs, 100);
        assert_eq!(config.auth.access_ttl_hours, 12);
        assert_eq!(config.auth.refresh_ttl_hours, 100);
        assert_eq!(config.auth.refresh_timeout_secs, 10);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("SurrealDB".parse::<StoreBackend>().unwrap(), StoreBackend::Surreal);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(key)) if key == "JWT_SECRET"
        ));

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_lifetime_bounds() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "s3cret".to_string();

        config.auth.access_ttl_hours = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "JWT_ACCESS_TTL_HOURS"
        ));

        config.auth.access_ttl_hours = 12;
        config.auth.refresh_ttl_hours = i64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "JWT_REFRESH_TTL_HOURS"
        ));

        config.auth.refresh_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_is_redacted_in_debug_output() {
        let mut config = AuthConfig::default();
        config.jwt_secret = "do-not-print-me".to_string();

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("do-not-print-me"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            cors_enabled = false
            cors_origins = []

            [database]
            backend = "memory"
            surrealdb_url = "ws://db:8000"
            surrealdb_user = "root"
            surrealdb_pass = "root"
            surrealdb_namespace = "cinedex"
            surrealdb_database = "catalog"
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.auth.refresh_ttl_hours, 100);
        assert_eq!(config.logging.level, "info");
    }
}
