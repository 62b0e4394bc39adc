//! Credential endpoint client.

use crate::config::ClientConfig;
use crate::errors::SessionError;
use async_trait::async_trait;
use common::secret::SecretString;
use common::types::InterviewType;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{instrument, warn};

/// TCP connect bound, independent of the overall request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Parameters for a grant request. All optional; the issuer generates
/// room and participant names when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRequest {
    pub room_name: Option<String>,
    pub participant_name: Option<String>,
    pub interview_type: Option<InterviewType>,
}

impl SessionRequest {
    #[must_use]
    pub fn with_interview_type(mut self, interview_type: InterviewType) -> Self {
        self.interview_type = Some(interview_type);
        self
    }

    #[must_use]
    pub fn with_room(mut self, room_name: impl Into<String>) -> Self {
        self.room_name = Some(room_name.into());
        self
    }

    #[must_use]
    pub fn with_participant(mut self, participant_name: impl Into<String>) -> Self {
        self.participant_name = Some(participant_name.into());
        self
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(room) = &self.room_name {
            pairs.push(("roomName", room.clone()));
        }
        if let Some(participant) = &self.participant_name {
            pairs.push(("participantName", participant.clone()));
        }
        if let Some(interview_type) = self.interview_type {
            pairs.push(("interviewType", interview_type.as_str().to_string()));
        }
        pairs
    }
}

/// A grant as delivered by the credential endpoint.
#[derive(Clone)]
pub struct FetchedGrant {
    pub token: SecretString,
    pub url: String,
    pub room_name: String,
}

impl fmt::Debug for FetchedGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedGrant")
            .field("token", &"[REDACTED]")
            .field("url", &self.url)
            .field("room_name", &self.room_name)
            .finish()
    }
}

/// Source of session grants.
#[async_trait]
pub trait GrantSource: Send + Sync {
    async fn fetch(&self, request: &SessionRequest) -> Result<FetchedGrant, SessionError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    token: String,
    url: String,
    room_name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

/// [`GrantSource`] backed by the HTTP credential endpoint.
#[derive(Clone)]
pub struct HttpGrantSource {
    client: Client,
    endpoint: String,
}

impl HttpGrantSource {
    /// # Errors
    ///
    /// Returns `SessionError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.http_timeout))
            .build()
            .map_err(|e| {
                tracing::error!(target: "session.grant_source", error = %e, "Failed to build HTTP client");
                SessionError::Internal("HTTP client construction failed".to_string())
            })?;

        Ok(Self {
            client,
            endpoint: config.credential_endpoint.clone(),
        })
    }
}

#[async_trait]
impl GrantSource for HttpGrantSource {
    #[instrument(skip_all, name = "session.grant_source.fetch")]
    async fn fetch(&self, request: &SessionRequest) -> Result<FetchedGrant, SessionError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(|e| {
                warn!(target: "session.grant_source", error = %e, "Credential endpoint unreachable");
                SessionError::CredentialFetchFailed {
                    status: None,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(target: "session.grant_source", error = %e, "Failed to read credential response");
            SessionError::CredentialFetchFailed {
                status: Some(status.as_u16()),
                message: e.to_string(),
            }
        })?;

        if status.is_success() {
            let parsed: TokenBody = serde_json::from_str(&body).map_err(|e| {
                warn!(target: "session.grant_source", error = %e, "Unparseable credential response");
                SessionError::CredentialFetchFailed {
                    status: Some(status.as_u16()),
                    message: format!("Unparseable credential response: {e}"),
                }
            })?;

            return Ok(FetchedGrant {
                token: SecretString::from(parsed.token),
                url: parsed.url,
                room_name: parsed.room_name,
            });
        }

        let code = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.code);
        if status.is_server_error() && code.as_deref() == Some("SERVER_MISCONFIGURED") {
            warn!(target: "session.grant_source", "Credential endpoint reports misconfiguration");
            return Err(SessionError::Misconfigured);
        }

        warn!(
            target: "session.grant_source",
            status = status.as_u16(),
            "Credential endpoint returned an error"
        );
        Err(SessionError::CredentialFetchFailed {
            status: Some(status.as_u16()),
            message: body,
        })
    }
}
