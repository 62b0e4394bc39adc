//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued grants. Grants are verified
//! against the fixed test credentials.

use crate::crypto_fixtures::{TEST_KEY_ID, TEST_SIGNING_SECRET};
use common::grant::{extract_kid, verify_grant, GrantClaims, Permission, DEFAULT_CLOCK_SKEW};
use common::types::InterviewType;

/// Custom assertions for grant tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_grant()
///     .assert_for_room("interview-1")
///     .assert_interview_permissions();
/// ```
pub trait GrantAssertions {
    /// Assert that the grant verifies against the test credentials
    fn assert_valid_grant(&self) -> &Self;

    /// Assert that the grant is scoped to `room`
    fn assert_for_room(&self, room: &str) -> &Self;

    /// Assert that the grant is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the grant carries exactly join, publish and subscribe
    fn assert_interview_permissions(&self) -> &Self;

    /// Assert the interview category in the grant metadata
    fn assert_interview_type(&self, interview_type: InterviewType) -> &Self;

    /// Assert that the grant expires within the specified seconds
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

fn claims_of(token: &str) -> GrantClaims {
    verify_grant(
        token,
        TEST_KEY_ID,
        TEST_SIGNING_SECRET.as_bytes(),
        DEFAULT_CLOCK_SKEW,
    )
    .unwrap_or_else(|e| panic!("Grant failed verification: {e}"))
}

impl GrantAssertions for str {
    fn assert_valid_grant(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "Grant must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let kid = extract_kid(self).unwrap_or_else(|e| panic!("Grant header unreadable: {e}"));
        assert_eq!(kid, TEST_KEY_ID, "Grant signed with unexpected key");

        claims_of(self);
        self
    }

    fn assert_for_room(&self, room: &str) -> &Self {
        assert_eq!(claims_of(self).room.name, room, "Grant room mismatch");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        assert_eq!(claims_of(self).sub, subject, "Grant subject mismatch");
        self
    }

    fn assert_interview_permissions(&self) -> &Self {
        assert_eq!(
            claims_of(self).room.permissions,
            Permission::interview_set(),
            "Grant permissions must be exactly join, publish, subscribe"
        );
        self
    }

    fn assert_interview_type(&self, interview_type: InterviewType) -> &Self {
        assert_eq!(
            claims_of(self).metadata.interview_type,
            interview_type,
            "Grant interview type mismatch"
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = claims_of(self);
        let remaining = claims.exp - chrono::Utc::now().timestamp();
        assert!(
            remaining > 0 && remaining <= seconds,
            "Grant should expire within {seconds}s, expires in {remaining}s"
        );
        self
    }
}
