//! Fixed signing credentials and configurations.

use common::secret::SecretString;
use common::types::InterviewType;
use grant_service::config::{Config, SigningCredentials, DEFAULT_GRANT_TTL_SECONDS};

/// Signing key identifier used across tests.
pub const TEST_KEY_ID: &str = "APItestkey01";

/// Signing secret used across tests (32 bytes).
pub const TEST_SIGNING_SECRET: &str = "test-signing-secret-0123456789ab";

/// Transport address handed out by test servers.
pub const TEST_TRANSPORT_URL: &str = "wss://rtc.test.invalid";

#[must_use]
pub fn test_signing_credentials() -> SigningCredentials {
    SigningCredentials {
        key_id: TEST_KEY_ID.to_string(),
        secret: SecretString::from(TEST_SIGNING_SECRET),
    }
}

/// Grant service configuration that can sign, bound to an ephemeral port.
#[must_use]
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        signing: Some(test_signing_credentials()),
        transport_url: TEST_TRANSPORT_URL.to_string(),
        grant_ttl_seconds: DEFAULT_GRANT_TTL_SECONDS,
        default_interview_type: InterviewType::Behavioral,
        cors_allowed_origin: None,
    }
}

/// Configuration with the signing credentials absent.
#[must_use]
pub fn test_config_without_signing() -> Config {
    Config {
        signing: None,
        ..test_config()
    }
}
