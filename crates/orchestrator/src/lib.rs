//! HTTP surface of the orchestrator service.
//!
//! Incoming commands arrive on `POST /rpc/{pattern}` and entity-change
//! events on `POST /events/{name}`. Both are served by one [`Orchestrator`],
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod service;
pub mod upstream;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use cache::InMemoryCacheStore;
use metrics_exporter_prometheus::PrometheusHandle;
use rpc::{InMemoryTransport, RemoteClient};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
pub use service::Orchestrator;
use upstream::StandaloneServices;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(orchestrator: Arc<Orchestrator>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/rpc/{pattern}", post(routes::rpc::dispatch))
        .route("/events/{name}", post(routes::events::receive))
        .with_state(orchestrator)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Backends of a standalone orchestrator, exposed for inspection.
#[derive(Clone)]
pub struct Standalone {
    pub transport: InMemoryTransport,
    pub cache: InMemoryCacheStore,
    pub services: StandaloneServices,
}

/// Creates an orchestrator backed by an in-memory cache and seeded
/// in-process upstream services.
///
/// The transport journal is capped at `config.journal_capacity` and the
/// cache sweeps expired entries every `config.cache_sweep_interval`, so a
/// long-running standalone server stays bounded.
pub fn create_default_state(config: &Config) -> (Arc<Orchestrator>, Standalone) {
    let transport = InMemoryTransport::with_journal_capacity(config.journal_capacity);
    let services = StandaloneServices::install(&transport);
    let cache = InMemoryCacheStore::with_sweep_interval(config.cache_sweep_interval);

    let client =
        RemoteClient::new(Arc::new(transport.clone())).with_default_timeout(config.rpc_timeout);
    let orchestrator = Orchestrator::new(
        client,
        Arc::new(cache.clone()),
        config.composer_config(),
        config.saga_config(),
    );

    (
        Arc::new(orchestrator),
        Standalone {
            transport,
            cache,
            services,
        },
    )
}
