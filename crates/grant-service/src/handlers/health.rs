//! Liveness and readiness probes.

use crate::handlers::AppState;
use crate::models::ReadinessResponse;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Liveness probe. The process is up.
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe.
///
/// Returns 503 while signing credentials are absent so orchestrators do not
/// route grant traffic to an instance that can only answer
/// `SERVER_MISCONFIGURED`.
///
/// GET /ready
#[instrument(skip_all, name = "gs.health.ready")]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    if state.config.can_sign() {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready".to_string(),
                signing: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready".to_string(),
                signing: Some("unconfigured".to_string()),
            }),
        )
    }
}
