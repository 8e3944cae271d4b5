//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::util::rate_limit::PLAYER_REQUEST_RATE_LIMIT;
use crate::util::time::TICK_INTERVAL_MS;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Allowed client origins for CORS, comma separated
    pub client_origin: String,
    /// HMAC secret shared with the account service that issues player tokens
    pub auth_token_secret: String,

    /// Minimum time between two simulation steps of a match
    pub tick_interval: Duration,
    /// Matches with no activity for this long are evicted
    pub match_idle_ttl: Duration,
    /// How often the eviction sweep runs
    pub sweep_interval: Duration,
    /// Request budget per player per second
    pub requests_per_second: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR so platform-assigned ports work
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN")
                .map_err(|_| ConfigError::Missing("CLIENT_ORIGIN"))?,
            auth_token_secret: env::var("AUTH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("AUTH_TOKEN_SECRET"))?,

            tick_interval: Duration::from_millis(parse_or("TICK_INTERVAL_MS", TICK_INTERVAL_MS)?),
            match_idle_ttl: Duration::from_secs(parse_or("MATCH_IDLE_TTL_SECS", 600)?),
            sweep_interval: Duration::from_secs(parse_positive_or("SWEEP_INTERVAL_SECS", 60)?),
            requests_per_second: parse_or("REQUESTS_PER_SECOND", PLAYER_REQUEST_RATE_LIMIT)?,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber(key)),
        Err(_) => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected
fn parse_positive_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, default)? {
        0 => Err(ConfigError::InvalidNumber(key)),
        value => Ok(value),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Environment variable {0} must be a valid number")]
    InvalidNumber(&'static str),
}
