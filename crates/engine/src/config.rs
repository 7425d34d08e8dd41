//! Configuration types and loader
//!
//! ```toml
//! database_url = "sqlite:prereq.db?mode=rwc"
//! audit_dir = "data/audit"
//! listen = "127.0.0.1:3000"
//!
//! [engine]
//! warning_window_days = 30
//! store_timeout_ms = 5000
//! cache_effective_rules = true
//! ```

use prereq_core::DEFAULT_WARNING_WINDOW_DAYS;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days before expiry at which a document turns "por vencer"
    #[serde(default = "default_warning_window")]
    pub warning_window_days: i64,

    /// Store fetches slower than this fail with `DataUnavailable`
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,

    /// Cache effective rules per scope, revalidated against the store's rule version
    #[serde(default = "default_true")]
    pub cache_effective_rules: bool,
}

fn default_warning_window() -> i64 {
    DEFAULT_WARNING_WINDOW_DAYS
}

fn default_store_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warning_window_days: default_warning_window(),
            store_timeout_ms: default_store_timeout(),
            cache_effective_rules: true,
        }
    }
}

/// Application configuration shared by the CLI and the API server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,

    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_database_url() -> String {
    "sqlite:data/prereq.db?mode=rwc".to_string()
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("data/audit")
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            audit_dir: default_audit_dir(),
            listen: default_listen_addr(),
            engine: EngineConfig::default(),
        }
    }
}

/// Reads and validates [`AppConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::load_str(&content)?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    pub fn load_str(content: &str) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// File when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        match path {
            Some(path) => Self::load_file(path),
            None => Ok(AppConfig::default()),
        }
    }

    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.database_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database_url must not be empty".to_string(),
            ));
        }

        if config.engine.warning_window_days < 0 {
            return Err(ConfigError::Validation(format!(
                "warning_window_days must be >= 0, got {}",
                config.engine.warning_window_days
            )));
        }

        if config.engine.store_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "store_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
