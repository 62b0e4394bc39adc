//! Builder for signed test grants.

use crate::crypto_fixtures::{TEST_KEY_ID, TEST_SIGNING_SECRET};
use chrono::{Duration, Utc};
use common::grant::{GrantClaims, GrantMetadata, Permission, RoomGrant, GRANT_ALGORITHM};
use common::types::{InterviewType, ParticipantRole};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::BTreeSet;

/// Builder for HS256 grants.
///
/// # Example
/// ```rust,ignore
/// let token = TestGrantBuilder::new()
///     .for_room("interview-1")
///     .for_identity("alice")
///     .expires_in(60)
///     .build();
/// ```
pub struct TestGrantBuilder {
    claims: GrantClaims,
    key_id: String,
    secret: String,
}

impl TestGrantBuilder {
    /// A valid one-hour grant signed with the test credentials.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            claims: GrantClaims {
                iss: TEST_KEY_ID.to_string(),
                sub: "candidate-test".to_string(),
                jti: uuid::Uuid::new_v4().to_string(),
                iat: now,
                nbf: now,
                exp: now + 3600,
                room: RoomGrant::interview("interview-test"),
                metadata: GrantMetadata::default(),
            },
            key_id: TEST_KEY_ID.to_string(),
            secret: TEST_SIGNING_SECRET.to_string(),
        }
    }

    pub fn for_room(mut self, room: &str) -> Self {
        self.claims.room.name = room.to_string();
        self
    }

    pub fn for_identity(mut self, identity: &str) -> Self {
        self.claims.sub = identity.to_string();
        self
    }

    pub fn with_interview_type(mut self, interview_type: InterviewType) -> Self {
        self.claims.metadata.interview_type = interview_type;
        self
    }

    pub fn with_role(mut self, role: ParticipantRole) -> Self {
        self.claims.metadata.role = role;
        self
    }

    pub fn with_permissions(mut self, permissions: &[Permission]) -> Self {
        self.claims.room.permissions = permissions.iter().copied().collect::<BTreeSet<_>>();
        self
    }

    /// Set expiration in seconds from now. Negative values build an expired
    /// grant.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.claims.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Sign with different credentials.
    pub fn signed_with(mut self, key_id: &str, secret: &str) -> Self {
        self.key_id = key_id.to_string();
        self.claims.iss = key_id.to_string();
        self.secret = secret.to_string();
        self
    }

    pub fn claims(&self) -> &GrantClaims {
        &self.claims
    }

    /// Sign and encode.
    pub fn build(self) -> String {
        let mut header = Header::new(GRANT_ALGORITHM);
        header.kid = Some(self.key_id);
        encode(
            &header,
            &self.claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("test grant should encode")
    }
}

impl Default for TestGrantBuilder {
    fn default() -> Self {
        Self::new()
    }
}
