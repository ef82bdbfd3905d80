//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use std::net::SocketAddr;
use study_planner_core::DayOffsetPolicy;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where subjects, plans and templates are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local storage, lost on restart. Useful for demos and tests.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_level: Level,
    /// The users' wall-clock offset: decides "today", weekdays and plan weeks.
    pub utc_offset: FixedOffset,
    pub day_offset_policy: DayOffsetPolicy,
    pub cors_origin: String,
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

        // --- Load Server Settings ---
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
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Storage Settings ---
        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
        let storage = match backend.as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: std::env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Load Scheduling Settings ---
        let offset_str = std::env::var("UTC_OFFSET_MINUTES").unwrap_or_else(|_| "0".to_string());
        let utc_offset = parse_utc_offset(&offset_str)?;

        let policy_str =
            std::env::var("DAY_OFFSET_POLICY").unwrap_or_else(|_| "next_week".to_string());
        let day_offset_policy = policy_str.parse::<DayOffsetPolicy>().map_err(|e| {
            ConfigError::InvalidValue("DAY_OFFSET_POLICY".to_string(), e.to_string())
        })?;

        Ok(Self {
            bind_address,
            storage,
            log_level,
            utc_offset,
            day_offset_policy,
            cors_origin,
        })
    }
}

/// Parses a signed minute count ("-300", "90") into a fixed UTC offset.
fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || {
        ConfigError::InvalidValue(
            "UTC_OFFSET_MINUTES".to_string(),
            format!("'{}' is not an offset in minutes between -1439 and 1439", value),
        )
    };
    let minutes = value.trim().parse::<i32>().map_err(|_| invalid())?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(invalid)
}
