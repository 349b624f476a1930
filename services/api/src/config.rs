//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use meal_planner_core::{StorageKeys, CURRENT_SCHEMA_VERSION};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Browsers typically grant each origin about this much local storage.
const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub storage_dir: PathBuf,
    /// `None` disables the quota.
    pub storage_quota_bytes: Option<u64>,
    pub schema_version: String,
    pub key_prefix: String,
    pub cors_origin: String,
    pub event_history: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());
        HeaderValue::from_str(&cors_origin)
            .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;

        // --- Storage Settings ---
        let storage_dir = std::env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let storage_quota_bytes = match std::env::var("STORAGE_QUOTA_BYTES") {
            Ok(raw) => parse_quota(&raw)?,
            Err(_) => Some(DEFAULT_QUOTA_BYTES),
        };

        let schema_version = std::env::var("SCHEMA_VERSION")
            .unwrap_or_else(|_| CURRENT_SCHEMA_VERSION.to_string());
        if schema_version.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "SCHEMA_VERSION".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let key_prefix = std::env::var("KEY_PREFIX")
            .unwrap_or_else(|_| StorageKeys::DEFAULT_PREFIX.to_string());

        let event_history = match std::env::var("EVENT_HISTORY") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("EVENT_HISTORY".to_string(), e.to_string())
            })?,
            Err(_) => 64,
        };

        Ok(Self {
            bind_address,
            log_level,
            storage_dir,
            storage_quota_bytes,
            schema_version,
            key_prefix,
            cors_origin,
            event_history,
        })
    }

    /// Configuration pointing at `storage_dir` with defaults everywhere else.
    pub fn for_tests(storage_dir: PathBuf) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: Level::DEBUG,
            storage_dir,
            storage_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            key_prefix: StorageKeys::DEFAULT_PREFIX.to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            event_history: 64,
        }
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.key_prefix)
    }
}

/// `0` or `none` turns the quota off.
fn parse_quota(raw: &str) -> Result<Option<u64>, ConfigError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let bytes = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue("STORAGE_QUOTA_BYTES".to_string(), e.to_string()))?;
    Ok((bytes > 0).then_some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_parsing() {
        assert_eq!(parse_quota("1024").unwrap(), Some(1024));
        assert_eq!(parse_quota("0").unwrap(), None);
        assert_eq!(parse_quota(" NONE ").unwrap(), None);
        assert!(matches!(
            parse_quota("lots"),
            Err(ConfigError::InvalidValue(var, _)) if var == "STORAGE_QUOTA_BYTES"
        ));
    }

    #[test]
    fn storage_keys_follow_prefix() {
        let mut config = Config::for_tests(PathBuf::from("/tmp/unused"));
        config.key_prefix = "dm_".to_string();
        assert_eq!(config.storage_keys().profile, "dm_user_profile");
    }
}
