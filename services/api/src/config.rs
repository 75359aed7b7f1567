//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

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
    /// Origin the shareable interview links are built from.
    pub public_origin: String,
    pub cors_origin: String,
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub voice_agent_id: String,
    /// Stand-in for real end-of-call detection: a started participant session
    /// is completed once this much time has passed.
    pub session_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            public_origin: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: Level::INFO,
            voice_agent_id: "demo-agent-id".to_string(),
            session_timeout: Duration::from_secs(60),
        }
    }
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let public_origin = lookup("PUBLIC_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string())
            .unwrap_or(defaults.public_origin);
        if !public_origin.starts_with("http://") && !public_origin.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PUBLIC_ORIGIN".to_string(),
                format!("'{}' must start with http:// or https://", public_origin),
            ));
        }

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        // --- Voice Agent ---
        let voice_agent_id = lookup("VOICE_AGENT_ID").unwrap_or(defaults.voice_agent_id);

        let session_timeout = match lookup("SESSION_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("SESSION_TIMEOUT_SECS".to_string(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "SESSION_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.session_timeout,
        };

        Ok(Self {
            bind_address,
            public_origin,
            cors_origin,
            data_dir,
            log_level,
            voice_agent_id,
            session_timeout,
        })
    }
}
