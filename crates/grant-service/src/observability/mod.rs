//! Observability for the grant service.
//!
//! Handlers and services use `#[instrument(skip_all)]` and name the fields
//! they log explicitly. Field classes:
//! - **SAFE**: room names, interview categories, outcome labels
//! - **HASHED**: participant identities (see [`hash_for_correlation`])
//! - **NEVER**: grants, signing secrets

pub mod metrics;

pub use metrics::{init_metrics_recorder, record_grant_error, record_grant_issuance};

use sha2::{Digest, Sha256};

/// Hash a value for log correlation (SHA-256, first 8 hex chars).
///
/// One-way and truncated. Lets operators follow a participant across log
/// lines without writing the identity itself.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest
        .get(..4)
        .map(hex::encode)
        .unwrap_or_default()
}
