//! Type-Safe Configuration with Validation
//!
//! Loads the gate's settings from environment variables (and an optional
//! `.env` file), then validates them before anything is wired up.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

use crate::bypass::{BypassRule, MatchMode};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable holding the URL
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid timeout value
    #[error("Invalid timeout for {0}: must be greater than 0")]
    InvalidTimeout(String),

    /// Invalid threshold value
    #[error("Invalid threshold: must be greater than 0")]
    InvalidThreshold,

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// What was wrong with the value
        reason: String,
    },
}

/// Which revocation store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Redis via connection manager
    Redis,
    /// Process-local map, for development
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Token validation settings.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Shared HMAC secret
    pub secret: String,
    /// Expected signing algorithm
    pub algorithm: Algorithm,
    /// Clock skew tolerance applied to expiry
    pub leeway_secs: u64,
}

/// Revocation store settings.
#[derive(Debug, Clone)]
pub struct RevocationSettings {
    /// Backend selection
    pub backend: StoreBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Prefix prepended to every blacklist key
    pub key_prefix: String,
    /// Store SHA-256 of the token instead of the raw token
    pub hash_keys: bool,
    /// Per-lookup time budget
    pub lookup_timeout: Duration,
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open
    pub circuit_timeout: Duration,
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Downstream base URL
    pub upstream_url: Url,
    /// Downstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Token validation
    pub jwt: JwtSettings,
    /// Revocation store
    pub revocation: RevocationSettings,
    /// How bypass patterns are compared to paths
    pub bypass_mode: MatchMode,
    /// Bypass rule groups
    pub bypass_rules: Vec<BypassRule>,
    /// Log level filter
    pub log_level: String,
    /// JSON log output
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8080)?,
            upstream_url: parse_url_env("UPSTREAM_URL", "http://localhost:8081")?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT", 30)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            jwt: JwtSettings {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingRequired("JWT_SECRET".to_string()))?,
                algorithm: parse_algorithm_env("JWT_ALGORITHM", Algorithm::HS256)?,
                leeway_secs: parse_env("JWT_LEEWAY_SECS", 0)?,
            },
            revocation: RevocationSettings {
                backend: parse_env("REVOCATION_STORE", StoreBackend::Redis)?,
                redis_url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
                key_prefix: env::var("REVOCATION_KEY_PREFIX")
                    .unwrap_or_else(|_| "blacklist:".to_string()),
                hash_keys: parse_env("REVOCATION_HASH_KEYS", true)?,
                lookup_timeout: Duration::from_millis(parse_env("REVOCATION_TIMEOUT_MS", 250)?),
                failure_threshold: parse_env("CB_FAILURE_THRESHOLD", 5)?,
                circuit_timeout: Duration::from_secs(parse_env("CB_TIMEOUT", 30)?),
            },
            bypass_mode: parse_env("BYPASS_MATCH_MODE", MatchMode::Segment)?,
            bypass_rules: vec![
                parse_rule_env("BYPASS_SWAGGER_PATHS", BypassRule::swagger()),
                parse_rule_env("BYPASS_OAUTH_PATHS", BypassRule::oauth()),
                parse_rule_env("BYPASS_PUBLIC_PATHS", BypassRule::public_auth()),
            ],
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: parse_env("LOG_JSON", true)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.revocation.lookup_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("REVOCATION_TIMEOUT_MS".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("REQUEST_TIMEOUT".to_string()));
        }
        if self.revocation.failure_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.revocation.key_prefix.is_empty() {
            return Err(ConfigError::MissingRequired("REVOCATION_KEY_PREFIX".to_string()));
        }
        for rule in &self.bypass_rules {
            if rule.patterns().iter().any(|p| p.trim_matches('/').is_empty()) {
                return Err(ConfigError::ParseError {
                    name: format!("bypass group {}", rule.name()),
                    reason: "patterns must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Listen address as `host:port`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Downstream request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

/// Only HMAC algorithms are accepted: the gate holds a shared secret.
fn parse_algorithm_env(name: &str, default: Algorithm) -> Result<Algorithm, ConfigError> {
    let algorithm = parse_env(name, default)?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(ConfigError::ParseError {
            name: name.to_string(),
            reason: format!("{other:?} is not an HMAC algorithm"),
        }),
    }
}

/// Parse a comma-separated list environment variable.
fn parse_list_env(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Override a rule group's patterns from the environment, keeping its name.
fn parse_rule_env(name: &str, default: BypassRule) -> BypassRule {
    match parse_list_env(name) {
        Some(patterns) => BypassRule::new(default.name(), patterns),
        None => default,
    }
}
