//! HTTP routes for the grant service.

use crate::handlers::{self, AppState};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::init_metrics_recorder;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application router.
///
/// - `GET /api/token` issues a grant
/// - `GET /health` liveness
/// - `GET /ready` readiness (503 without signing credentials)
/// - `GET /metrics` Prometheus scrape
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    let api_routes = Router::new()
        .route("/api/token", get(handlers::handle_token_request))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(metrics_routes)
        .route("/health", get(handlers::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Browser clients call `/api/token` cross-origin. An unparseable configured
/// origin falls back to allowing any origin.
fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::GET]);

    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!(
                target: "gs.routes",
                error = %e,
                "CORS_ALLOWED_ORIGIN is not a valid header value, allowing any origin"
            );
            base.allow_origin(Any)
        }
        None => base.allow_origin(Any),
    }
}
