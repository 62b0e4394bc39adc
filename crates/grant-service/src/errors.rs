use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable code for "the server cannot issue credentials".
pub const CODE_SERVER_MISCONFIGURED: &str = "SERVER_MISCONFIGURED";

/// Stable code for a rejected request parameter.
pub const CODE_INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Stable code for any other internal failure.
pub const CODE_INTERNAL_ERROR: &str = "INTERNAL_ERROR";

#[derive(Debug, Error)]
pub enum GsError {
    /// Signing credentials are absent from the runtime configuration.
    #[error("Server misconfigured")]
    Misconfigured,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl GsError {
    /// Stable, machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            GsError::Misconfigured => CODE_SERVER_MISCONFIGURED,
            GsError::InvalidRequest(_) => CODE_INVALID_REQUEST,
            GsError::Crypto(_) | GsError::Internal => CODE_INTERNAL_ERROR,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GsError::Misconfigured | GsError::Crypto(_) | GsError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-safe message. Never names configuration variables or leaks
    /// cryptographic detail.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            GsError::Misconfigured => "Server misconfigured".to_string(),
            GsError::InvalidRequest(reason) => reason.clone(),
            GsError::Crypto(_) | GsError::Internal => "An internal error occurred".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for GsError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.client_message(),
            code: self.error_code(),
        };

        (self.status(), Json(body)).into_response()
    }
}
