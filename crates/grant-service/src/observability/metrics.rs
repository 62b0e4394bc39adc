//! Grant service metrics.
//!
//! Naming follows Prometheus conventions with a `gs_` prefix. Labels are
//! bounded: `status` is `success` or `error`, `code` is one of the stable
//! error codes from [`crate::errors`].

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// # Errors
///
/// Returns an error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gs_grant_issuance".to_string()),
            &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500],
        )
        .map_err(|e| format!("Failed to set grant issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record a grant issuance attempt.
///
/// Metric: `gs_grant_issuance_total`, `gs_grant_issuance_duration_seconds`
/// Labels: `status`
pub fn record_grant_issuance(status: &str, duration: Duration) {
    histogram!("gs_grant_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("gs_grant_issuance_total", "status" => status.to_string()).increment(1);
}

/// Record a failed issuance by error code.
///
/// Metric: `gs_grant_errors_total`
/// Labels: `code`
pub fn record_grant_error(code: &str) {
    counter!("gs_grant_errors_total", "code" => code.to_string()).increment(1);
}
