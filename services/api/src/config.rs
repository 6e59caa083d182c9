//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Postgres connection string. The in-memory document store is used when unset.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    /// Allowed CORS origin. Any origin is allowed when unset.
    pub client_origin: Option<HeaderValue>,
    pub otp_ttl_seconds: i64,
    /// Development-only fixed one-time code.
    pub otp_fixed_code: Option<String>,
    pub otp_max_attempts: u32,
    /// Requests each client address may make per minute.
    pub rate_limit_per_minute: u32,
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
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Auth Settings ---
        let jwt_secret = var("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        let jwt_ttl_days = parse_positive(&var, "JWT_TTL_DAYS", 7)?;

        let client_origin = var("CLIENT_ORIGIN")
            .filter(|origin| origin != "*")
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| {
                    ConfigError::InvalidValue("CLIENT_ORIGIN".to_string(), e.to_string())
                })
            })
            .transpose()?;

        // --- One-time Code Settings ---
        let otp_ttl_seconds = parse_positive(&var, "OTP_TTL_SECONDS", 300)?;
        let otp_fixed_code = var("OTP_FIXED_CODE");
        if let Some(code) = &otp_fixed_code {
            if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::InvalidValue(
                    "OTP_FIXED_CODE".to_string(),
                    "must be exactly 6 digits".to_string(),
                ));
            }
        }
        let otp_max_attempts = parse_positive(&var, "OTP_MAX_ATTEMPTS", 5)?;

        // --- Rate Limiting ---
        let rate_limit_per_minute = parse_positive(&var, "RATE_LIMIT_PER_MINUTE", 120)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            jwt_ttl_days,
            client_origin,
            otp_ttl_seconds,
            otp_fixed_code,
            otp_max_attempts: narrow("OTP_MAX_ATTEMPTS", otp_max_attempts)?,
            rate_limit_per_minute: narrow("RATE_LIMIT_PER_MINUTE", rate_limit_per_minute)?,
        })
    }
}

fn parse_positive(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = var(name) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

fn narrow(name: &str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), format!("{} is too large", value)))
}
