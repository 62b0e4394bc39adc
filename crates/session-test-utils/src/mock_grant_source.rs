//! Grant source mock that serves builder-made grants without HTTP.

use crate::crypto_fixtures::TEST_TRANSPORT_URL;
use crate::token_builders::TestGrantBuilder;
use async_trait::async_trait;
use common::secret::SecretString;
use session_client::errors::SessionError;
use session_client::grant_source::{FetchedGrant, GrantSource, SessionRequest};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Behavior {
    /// Serve a grant expiring this many seconds from the fetch.
    Grant { expires_in: i64 },
    Fail(SessionError),
    Hang,
}

/// Mock grant source. Clones share state.
#[derive(Debug, Clone)]
pub struct MockGrantSource {
    inner: Arc<Mutex<MockGrantSourceInner>>,
}

#[derive(Debug)]
struct MockGrantSourceInner {
    behavior: Behavior,
    requests: Vec<SessionRequest>,
}

impl MockGrantSource {
    /// Serves one-hour grants honoring the requested room and participant.
    pub fn new() -> Self {
        Self::from_behavior(Behavior::Grant { expires_in: 3600 })
    }

    /// Serves grants expiring `seconds` after each fetch.
    #[must_use]
    pub fn expiring_in(seconds: i64) -> Self {
        Self::from_behavior(Behavior::Grant {
            expires_in: seconds,
        })
    }

    #[must_use]
    pub fn failing(error: SessionError) -> Self {
        Self::from_behavior(Behavior::Fail(error))
    }

    #[must_use]
    pub fn hanging() -> Self {
        Self::from_behavior(Behavior::Hang)
    }

    fn from_behavior(behavior: Behavior) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockGrantSourceInner {
                behavior,
                requests: Vec::new(),
            })),
        }
    }

    pub fn requests(&self) -> Vec<SessionRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }
}

impl Default for MockGrantSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GrantSource for MockGrantSource {
    async fn fetch(&self, request: &SessionRequest) -> Result<FetchedGrant, SessionError> {
        let behavior = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());
            inner.behavior.clone()
        };

        let expires_in = match behavior {
            Behavior::Grant { expires_in } => expires_in,
            Behavior::Fail(error) => return Err(error),
            Behavior::Hang => std::future::pending().await,
        };

        let room_name = request
            .room_name
            .clone()
            .unwrap_or_else(|| "interview-mock".to_string());
        let mut builder = TestGrantBuilder::new()
            .for_room(&room_name)
            .for_identity(
                request
                    .participant_name
                    .as_deref()
                    .unwrap_or("candidate-mock"),
            )
            .expires_in(expires_in);
        if let Some(interview_type) = request.interview_type {
            builder = builder.with_interview_type(interview_type);
        }

        Ok(FetchedGrant {
            token: SecretString::from(builder.build()),
            url: TEST_TRANSPORT_URL.to_string(),
            room_name,
        })
    }
}
