//! Liveness and readiness endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use document_store::DocumentStore;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub subscribers: usize,
}

/// GET /health: the process is up.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /ready: the document store answers a read.
pub async fn ready<S>(State(state): State<Arc<AppState<S>>>) -> Result<Json<ReadyResponse>, ApiError>
where
    S: DocumentStore + Clone + 'static,
{
    state.store.get("zones", Uuid::nil()).await?;
    Ok(Json(ReadyResponse {
        status: "ready",
        backend: state.backend,
        subscribers: state.marketplace.bus().subscriber_count(),
    }))
}
