use crate::config::Config;
use crate::errors::GsError;
use crate::models::{TokenQuery, TokenResponse};
use crate::observability::{record_grant_error, record_grant_issuance};
use crate::services::grant_service::{self, GrantRequest};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

/// Handle a grant request.
///
/// GET /api/token?roomName=&participantName=&interviewType=
#[instrument(skip_all, name = "gs.token.issue")]
pub async fn handle_token_request(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, GsError> {
    let start = Instant::now();

    // Parameters are not inspected when no grant could be signed anyway.
    let result = if state.config.can_sign() {
        query
            .map_err(|e| GsError::InvalidRequest(e.body_text()))
            .and_then(|Query(query)| GrantRequest::from_query(&query))
            .and_then(|request| grant_service::issue_grant(&state.config, &request))
    } else {
        Err(GsError::Misconfigured)
    };

    match result {
        Ok(issued) => {
            record_grant_issuance("success", start.elapsed());
            Ok(Json(TokenResponse {
                token: issued.token,
                url: issued.url,
                room_name: issued.claims.room.name,
                participant_name: issued.claims.sub,
                expires_at: issued.claims.exp,
            }))
        }
        Err(e) => {
            record_grant_issuance("error", start.elapsed());
            record_grant_error(e.error_code());
            match &e {
                GsError::InvalidRequest(reason) => tracing::debug!(
                    target: "gs.token.issue",
                    reason = %reason,
                    "Grant request rejected"
                ),
                _ => tracing::warn!(
                    target: "gs.token.issue",
                    code = e.error_code(),
                    error = %e,
                    "Grant issuance failed"
                ),
            }
            Err(e)
        }
    }
}
