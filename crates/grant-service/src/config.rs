//! Grant service configuration.
//!
//! Loaded once from environment variables at startup and injected into the
//! issuer. Signing credentials are optional at load time: when either value
//! is missing the service still starts, but every issuance fails with
//! `GsError::Misconfigured`.

use common::secret::SecretString;
use common::types::InterviewType;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default grant lifetime in seconds (1 hour).
pub const DEFAULT_GRANT_TTL_SECONDS: i64 = 3600;

/// Minimum grant lifetime in seconds.
pub const MIN_GRANT_TTL_SECONDS: i64 = 60;

/// Maximum grant lifetime in seconds (24 hours).
pub const MAX_GRANT_TTL_SECONDS: i64 = 86_400;

/// Recommended minimum signing secret length for HMAC-SHA256.
pub const MIN_SIGNING_SECRET_LENGTH: usize = 32;

/// Signing authority credentials.
#[derive(Clone)]
pub struct SigningCredentials {
    /// Signing key identifier (`kid` header and `iss` claim).
    pub key_id: String,

    /// Shared HMAC secret. Protected by `SecretString`.
    pub secret: SecretString,
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Grant service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Signing credentials; `None` when either value is absent.
    pub signing: Option<SigningCredentials>,

    /// Transport endpoint address handed to clients with each grant.
    pub transport_url: String,

    /// Grant lifetime in seconds.
    pub grant_ttl_seconds: i64,

    /// Category used when a request omits `interviewType`.
    pub default_interview_type: InterviewType,

    /// Allowed CORS origin; `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Read a variable, treating empty or whitespace-only values as absent.
fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let transport_url = non_empty(vars, "TRANSPORT_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("TRANSPORT_URL".to_string()))?;

        let bind_address =
            non_empty(vars, "BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let signing = match (
            non_empty(vars, "GRANT_SIGNING_KEY_ID"),
            non_empty(vars, "GRANT_SIGNING_SECRET"),
        ) {
            (Some(key_id), Some(secret)) => {
                if secret.len() < MIN_SIGNING_SECRET_LENGTH {
                    tracing::warn!(
                        target: "gs.config",
                        min_length = MIN_SIGNING_SECRET_LENGTH,
                        "Signing secret is shorter than recommended"
                    );
                }
                Some(SigningCredentials {
                    key_id,
                    secret: SecretString::from(secret),
                })
            }
            _ => None,
        };

        let grant_ttl_seconds = match non_empty(vars, "GRANT_TTL_SECONDS") {
            Some(raw) => {
                let ttl: i64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue(format!("GRANT_TTL_SECONDS must be an integer: {e}"))
                })?;
                if !(MIN_GRANT_TTL_SECONDS..=MAX_GRANT_TTL_SECONDS).contains(&ttl) {
                    return Err(ConfigError::InvalidValue(format!(
                        "GRANT_TTL_SECONDS must be between {MIN_GRANT_TTL_SECONDS} and {MAX_GRANT_TTL_SECONDS}, got {ttl}"
                    )));
                }
                ttl
            }
            None => DEFAULT_GRANT_TTL_SECONDS,
        };

        let default_interview_type = match non_empty(vars, "DEFAULT_INTERVIEW_TYPE") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "DEFAULT_INTERVIEW_TYPE has unsupported value '{raw}'"
                ))
            })?,
            None => InterviewType::default(),
        };

        let cors_allowed_origin = non_empty(vars, "CORS_ALLOWED_ORIGIN");

        Ok(Config {
            bind_address,
            signing,
            transport_url,
            grant_ttl_seconds,
            default_interview_type,
            cors_allowed_origin,
        })
    }

    /// Whether grants can be issued with this configuration.
    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }
}
