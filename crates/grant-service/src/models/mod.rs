use serde::{Deserialize, Serialize};

/// Query parameters accepted by `GET /api/token`. All optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    pub room_name: Option<String>,
    pub participant_name: Option<String>,
    pub interview_type: Option<String>,
}

/// Successful response of `GET /api/token`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Opaque signed grant.
    pub token: String,
    /// Transport endpoint address.
    pub url: String,
    /// Room name, echoed or generated.
    pub room_name: String,
    /// Participant identity, echoed or generated.
    pub participant_name: String,
    /// Grant expiry (Unix epoch seconds).
    pub expires_at: i64,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .field("url", &self.url)
            .field("room_name", &self.room_name)
            .field("participant_name", &self.participant_name)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Readiness probe body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing: Option<String>,
}
