use crate::config::Config;
use crate::crypto;
use crate::errors::GsError;
use crate::models::TokenQuery;
use crate::observability::hash_for_correlation;
use common::grant::{GrantClaims, GrantMetadata, RoomGrant};
use common::types::{InterviewType, ParticipantRole};
use tracing::instrument;
use uuid::Uuid;

/// Prefix for generated room names.
pub const ROOM_NAME_PREFIX: &str = "interview-";

/// Prefix for generated participant identities.
pub const IDENTITY_PREFIX: &str = "candidate-";

/// Random bytes in a generated suffix (12 hex chars, 48 bits).
const GENERATED_SUFFIX_BYTES: usize = 6;

/// Maximum accepted length for any request parameter.
pub const MAX_PARAM_LENGTH: usize = 128;

/// A grant request after parameter normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub room_name: Option<String>,
    pub participant_name: Option<String>,
    pub interview_type: Option<InterviewType>,
}

impl GrantRequest {
    /// Normalize and validate raw query parameters.
    ///
    /// Empty strings count as omitted. Unknown interview categories are
    /// rejected rather than coerced.
    pub fn from_query(query: &TokenQuery) -> Result<Self, GsError> {
        let room_name = normalize_param("roomName", query.room_name.as_deref())?;
        if room_name.as_deref().is_some_and(|r| r.contains('*')) {
            return Err(GsError::InvalidRequest(
                "roomName must not contain wildcards".to_string(),
            ));
        }

        let participant_name =
            normalize_param("participantName", query.participant_name.as_deref())?;

        let interview_type = normalize_param("interviewType", query.interview_type.as_deref())?
            .map(|raw| {
                raw.parse::<InterviewType>()
                    .map_err(|e| GsError::InvalidRequest(e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            room_name,
            participant_name,
            interview_type,
        })
    }
}

fn normalize_param(field: &str, value: Option<&str>) -> Result<Option<String>, GsError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.len() > MAX_PARAM_LENGTH {
        return Err(GsError::InvalidRequest(format!(
            "{field} must be at most {MAX_PARAM_LENGTH} bytes"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(GsError::InvalidRequest(format!(
            "{field} contains invalid characters"
        )));
    }

    Ok(Some(value.to_string()))
}

/// A freshly signed grant together with what the client needs to use it.
pub struct IssuedGrant {
    pub token: String,
    pub url: String,
    pub claims: GrantClaims,
}

/// Generate `<prefix><12 hex chars>` from the system CSPRNG.
///
/// Collision-resistant, not globally unique.
pub fn generate_name(prefix: &str) -> Result<String, GsError> {
    Ok(format!(
        "{prefix}{}",
        crypto::random_suffix(GENERATED_SUFFIX_BYTES)?
    ))
}

/// Issue a grant scoped to exactly one room and one identity.
///
/// Fails with `Misconfigured` before doing any other work when the signing
/// credentials are absent, so no partial or unsigned token can escape.
#[instrument(skip_all)]
pub fn issue_grant(config: &Config, request: &GrantRequest) -> Result<IssuedGrant, GsError> {
    issue_grant_at(config, request, chrono::Utc::now().timestamp())
}

/// Issue a grant against an explicit `now` (Unix epoch seconds).
pub fn issue_grant_at(
    config: &Config,
    request: &GrantRequest,
    now: i64,
) -> Result<IssuedGrant, GsError> {
    let Some(signing) = config.signing.as_ref() else {
        tracing::error!(
            target: "gs.service.grant",
            "Grant issuance refused: signing credentials are not configured"
        );
        return Err(GsError::Misconfigured);
    };

    let room_name = match &request.room_name {
        Some(name) => name.clone(),
        None => generate_name(ROOM_NAME_PREFIX)?,
    };
    let identity = match &request.participant_name {
        Some(name) => name.clone(),
        None => generate_name(IDENTITY_PREFIX)?,
    };
    let interview_type = request
        .interview_type
        .unwrap_or(config.default_interview_type);

    let claims = GrantClaims {
        iss: signing.key_id.clone(),
        sub: identity,
        jti: Uuid::new_v4().to_string(),
        iat: now,
        nbf: now,
        exp: now + config.grant_ttl_seconds,
        room: RoomGrant::interview(room_name),
        metadata: GrantMetadata {
            interview_type,
            role: ParticipantRole::Candidate,
        },
    };

    let token = crypto::sign_grant(&claims, signing)?;

    tracing::info!(
        target: "gs.service.grant",
        room = %claims.room.name,
        identity_hash = %hash_for_correlation(&claims.sub),
        interview_type = %interview_type,
        expires_at = claims.exp,
        "Grant issued"
    );

    Ok(IssuedGrant {
        token,
        url: config.transport_url.clone(),
        claims,
    })
}
