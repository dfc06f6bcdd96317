//! Prometheus metrics endpoint.

use std::time::Instant;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub started_at: Instant,
}

impl MetricsState {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle,
            started_at: Instant::now(),
        }
    }
}

/// GET /metrics: the Prometheus text exposition, with process uptime refreshed
/// on every scrape.
pub async fn get(State(state): State<MetricsState>) -> impl IntoResponse {
    metrics::gauge!("process_uptime_seconds").set(state.started_at.elapsed().as_secs_f64());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.handle.render(),
    )
}
