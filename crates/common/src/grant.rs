//! Session grant: the signed, scoped, time-bound credential that lets one
//! participant join one interview room.
//!
//! This module provides:
//! - The grant claims structure and permission set
//! - Size limits and clock skew constants
//! - Key ID extraction from grant headers
//! - Signature/expiry/scope verification (`verify_grant`)
//! - Unverified claim inspection for clients (`peek_grant`)
//!
//! # Wire format
//!
//! A grant is an HS256-signed JWT. The header carries `kid` (the signing key
//! identifier) and the claims look like:
//!
//! ```json
//! {
//!   "iss": "APIkey01",
//!   "sub": "candidate-1a2b3c4d5e6f",
//!   "jti": "5c0e...",
//!   "iat": 1700000000,
//!   "nbf": 1700000000,
//!   "exp": 1700003600,
//!   "room": { "name": "interview-0a1b2c3d4e5f", "permissions": ["join", "publish", "subscribe"] },
//!   "metadata": { "interview_type": "behavioral", "role": "candidate" }
//! }
//! ```
//!
//! # Security
//!
//! - Grants are size-checked BEFORE parsing
//! - Only HS256 is accepted
//! - Validation error messages are generic; details go to debug logs
//! - The `sub` field is redacted in Debug output
//! - Room names containing `*` are rejected (no wildcard room access)

use crate::types::{InterviewType, ParticipantRole};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed grant size in bytes (8KB).
///
/// Grants larger than this are rejected before any base64 decoding or
/// signature work. A typical grant is well under 1KB.
pub const MAX_GRANT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` validation (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Signing algorithm for all grants.
pub const GRANT_ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while validating a grant.
///
/// Display messages are intentionally identical so that a caller cannot
/// distinguish an expired grant from a forged one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrantValidationError {
    /// Grant exceeds `MAX_GRANT_SIZE_BYTES`.
    #[error("The grant is invalid or expired")]
    TokenTooLarge,

    /// Not a structurally valid JWT.
    #[error("The grant is invalid or expired")]
    MalformedToken,

    /// Header has no usable `kid`.
    #[error("The grant is invalid or expired")]
    MissingKid,

    /// `kid` does not match the verifying key.
    #[error("The grant is invalid or expired")]
    UnknownKey,

    /// Signature mismatch.
    #[error("The grant is invalid or expired")]
    InvalidSignature,

    /// `exp` is in the past.
    #[error("The grant is invalid or expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("The grant is invalid or expired")]
    NotYetValid,

    /// `iat` is too far in the future.
    #[error("The grant is invalid or expired")]
    IatTooFarInFuture,

    /// Room scope is empty, wildcarded or carries no permissions.
    #[error("The grant is invalid or expired")]
    InvalidScope,
}

impl GrantValidationError {
    /// Stable reason label for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            GrantValidationError::TokenTooLarge => "too_large",
            GrantValidationError::MalformedToken => "malformed",
            GrantValidationError::MissingKid => "missing_kid",
            GrantValidationError::UnknownKey => "unknown_key",
            GrantValidationError::InvalidSignature => "signature",
            GrantValidationError::Expired => "expired",
            GrantValidationError::NotYetValid => "not_yet_valid",
            GrantValidationError::IatTooFarInFuture => "clock_skew",
            GrantValidationError::InvalidScope => "scope",
        }
    }
}

// =============================================================================
// Claims Types
// =============================================================================

/// A single capability within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Join the room.
    Join,
    /// Publish local tracks (microphone).
    Publish,
    /// Subscribe to remote tracks (the agent's voice).
    Subscribe,
}

impl Permission {
    /// The complete permission set issued for an interview participant.
    #[must_use]
    pub fn interview_set() -> BTreeSet<Permission> {
        BTreeSet::from([Permission::Join, Permission::Publish, Permission::Subscribe])
    }
}

/// Room scope of a grant: exactly one room and what may be done in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomGrant {
    /// Room the grant is valid for. Never a wildcard.
    pub name: String,

    /// Permissions within that room.
    pub permissions: BTreeSet<Permission>,
}

impl RoomGrant {
    /// Room scope with the full interview permission set.
    #[must_use]
    pub fn interview(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Permission::interview_set(),
        }
    }
}

/// Structured metadata embedded in the grant for the agent participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantMetadata {
    /// Interview category the agent should run.
    pub interview_type: InterviewType,

    /// Role of the grant holder.
    pub role: ParticipantRole,
}

/// Grant claims.
#[derive(Clone, Serialize, Deserialize)]
pub struct GrantClaims {
    /// Issuer: the signing key identifier.
    pub iss: String,

    /// Subject identity, unique per participant. Redacted in Debug output.
    pub sub: String,

    /// Unique grant identifier.
    pub jti: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Room scope.
    pub room: RoomGrant,

    /// Structured metadata.
    pub metadata: GrantMetadata,
}

impl fmt::Debug for GrantClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("jti", &self.jti)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("room", &self.room)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl GrantClaims {
    /// Whether the grant is expired at the given Unix timestamp.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Seconds of validity remaining at `now` (zero once expired).
    #[must_use]
    pub fn remaining_at(&self, now: i64) -> Duration {
        let secs = self.exp.saturating_sub(now).max(0);
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` from a grant header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_GRANT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64 or invalid header JSON
/// - `MissingKid` - Header has no non-empty string `kid`
pub fn extract_kid(token: &str) -> Result<String, GrantValidationError> {
    if token.len() > MAX_GRANT_SIZE_BYTES {
        tracing::debug!(
            target: "common.grant",
            token_size = token.len(),
            max_size = MAX_GRANT_SIZE_BYTES,
            "Grant rejected: size exceeds maximum allowed"
        );
        return Err(GrantValidationError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.grant",
            parts = parts.len(),
            "Grant rejected: invalid JWT format"
        );
        return Err(GrantValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(GrantValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.grant", error = %e, "Failed to decode grant header base64");
        GrantValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.grant", error = %e, "Failed to parse grant header JSON");
        GrantValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(GrantValidationError::MissingKid)
}

/// Validate the `iat` claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` if `iat` is more than `clock_skew` ahead of now.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), GrantValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now`.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), GrantValidationError> {
    let clock_skew = clock_skew.min(MAX_CLOCK_SKEW);
    // Bounded by MAX_CLOCK_SKEW, fits in i64
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now + clock_skew_secs;

    if iat > max_iat {
        tracing::debug!(
            target: "common.grant",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Grant rejected: iat too far in the future"
        );
        return Err(GrantValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Check that the room scope is exactly one concrete room with permissions.
fn validate_scope(claims: &GrantClaims) -> Result<(), GrantValidationError> {
    let name = claims.room.name.trim();
    if name.is_empty() || name.contains('*') || claims.room.permissions.is_empty() {
        tracing::debug!(
            target: "common.grant",
            permissions = claims.room.permissions.len(),
            "Grant rejected: invalid room scope"
        );
        return Err(GrantValidationError::InvalidScope);
    }
    Ok(())
}

/// Verify a grant's signature, validity window and scope.
///
/// `key_id` must match the header `kid`; `secret` is the shared HMAC secret
/// for that key.
///
/// # Errors
///
/// Any `GrantValidationError` variant; all share the same generic message.
pub fn verify_grant(
    token: &str,
    key_id: &str,
    secret: &[u8],
    clock_skew: Duration,
) -> Result<GrantClaims, GrantValidationError> {
    let kid = extract_kid(token)?;
    if kid != key_id {
        tracing::debug!(target: "common.grant", "Grant rejected: unknown signing key");
        return Err(GrantValidationError::UnknownKey);
    }

    let mut validation = Validation::new(GRANT_ALGORITHM);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf", "iat", "sub"]);

    let token_data = decode::<GrantClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| {
            tracing::debug!(target: "common.grant", error = %e, "Grant verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => GrantValidationError::Expired,
                ErrorKind::ImmatureSignature => GrantValidationError::NotYetValid,
                ErrorKind::InvalidSignature => GrantValidationError::InvalidSignature,
                _ => GrantValidationError::MalformedToken,
            }
        })?;

    validate_iat(token_data.claims.iat, clock_skew)?;
    validate_scope(&token_data.claims)?;

    Ok(token_data.claims)
}

/// Decode grant claims WITHOUT verifying the signature or expiry.
///
/// Clients use this to learn their identity, room and expiry from a grant
/// they cannot verify. The result must never be used for authorization.
///
/// # Errors
///
/// `TokenTooLarge` or `MalformedToken`.
pub fn peek_grant(token: &str) -> Result<GrantClaims, GrantValidationError> {
    if token.len() > MAX_GRANT_SIZE_BYTES {
        return Err(GrantValidationError::TokenTooLarge);
    }

    let mut validation = Validation::new(GRANT_ALGORITHM);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<GrantClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(target: "common.grant", error = %e, "Failed to decode grant claims");
            GrantValidationError::MalformedToken
        })
}

// =============================================================================
// Tests
// =============================================================================
