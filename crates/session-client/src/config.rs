//! Session client configuration.
//!
//! Read once at process start and passed to [`crate::grant_source::HttpGrantSource`]
//! and [`crate::actors::SessionConnector`].

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for credential endpoint requests.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default bound on the transport handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECONDS: u64 = 15;

/// Default bound on time spent in `Reconnecting`.
pub const DEFAULT_RECONNECT_TIMEOUT_SECONDS: u64 = 30;

/// Minimum reconnect window in seconds.
pub const MIN_RECONNECT_TIMEOUT_SECONDS: u64 = 1;

/// Maximum reconnect window in seconds.
pub const MAX_RECONNECT_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the credential endpoint (e.g. `https://host/api/token`).
    pub credential_endpoint: String,

    /// Request timeout for the credential endpoint.
    pub http_timeout: Duration,

    /// Handshake bound; `None` waits indefinitely.
    pub handshake_timeout: Option<Duration>,

    /// Longest a session may stay in `Reconnecting` before failing.
    pub reconnect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl ClientConfig {
    /// Configuration with default timeouts.
    #[must_use]
    pub fn new(credential_endpoint: impl Into<String>) -> Self {
        Self {
            credential_endpoint: credential_endpoint.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            handshake_timeout: Some(Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECONDS)),
            reconnect_timeout: Duration::from_secs(DEFAULT_RECONNECT_TIMEOUT_SECONDS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let credential_endpoint = vars
            .get("SESSION_CREDENTIAL_ENDPOINT")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SESSION_CREDENTIAL_ENDPOINT".to_string()))?;

        let http_timeout_secs = parse_secs(
            vars,
            "SESSION_HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let handshake_secs = parse_secs(
            vars,
            "SESSION_HANDSHAKE_TIMEOUT_SECONDS",
            DEFAULT_HANDSHAKE_TIMEOUT_SECONDS,
        )?;

        let reconnect_secs = parse_secs(
            vars,
            "SESSION_RECONNECT_TIMEOUT_SECONDS",
            DEFAULT_RECONNECT_TIMEOUT_SECONDS,
        )?;
        if !(MIN_RECONNECT_TIMEOUT_SECONDS..=MAX_RECONNECT_TIMEOUT_SECONDS)
            .contains(&reconnect_secs)
        {
            return Err(ConfigError::InvalidValue(format!(
                "SESSION_RECONNECT_TIMEOUT_SECONDS must be between {MIN_RECONNECT_TIMEOUT_SECONDS} and {MAX_RECONNECT_TIMEOUT_SECONDS}, got {reconnect_secs}"
            )));
        }

        Ok(Self {
            credential_endpoint,
            http_timeout: Duration::from_secs(http_timeout_secs),
            // 0 disables the handshake bound
            handshake_timeout: (handshake_secs > 0).then(|| Duration::from_secs(handshake_secs)),
            reconnect_timeout: Duration::from_secs(reconnect_secs),
        })
    }
}

fn parse_secs(
    vars: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue(format!("{key} must be a non-negative integer: {e}"))
        }),
        None => Ok(default),
    }
}
