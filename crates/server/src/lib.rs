//! HTTP shell for the fulfillment coordinator.
//!
//! Exposes liveness, readiness and Prometheus metrics, with structured
//! logging (tracing) on every request.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use document_store::DocumentStore;
use event_bus::{EventBus, LoggingSubscriber};
use fulfillment::{CoordinatorConfig, Marketplace};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to request handlers.
pub struct AppState<S: DocumentStore> {
    pub marketplace: Marketplace<S>,
    pub store: S,
    /// Name of the storage backend, reported by `/ready`.
    pub backend: &'static str,
}

impl<S: DocumentStore + Clone> AppState<S> {
    pub fn new(store: S, backend: &'static str, config: CoordinatorConfig) -> Self {
        Self {
            marketplace: build_marketplace(store.clone(), config),
            store,
            backend,
        }
    }
}

/// Wires the fulfillment services over `store`, logging every published event.
pub fn build_marketplace<S: DocumentStore + Clone>(
    store: S,
    config: CoordinatorConfig,
) -> Marketplace<S> {
    let bus = EventBus::builder()
        .subscribe(Arc::new(LoggingSubscriber))
        .build();

    Marketplace::builder(store)
        .event_bus(bus)
        .config(config)
        .build()
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router
where
    S: DocumentStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(routes::metrics::MetricsState::new(metrics_handle));

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/ready", get(routes::health::ready::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
