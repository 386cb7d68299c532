//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::service::{HealthStatus, Orchestrator};

/// GET /health: reports cache and transport reachability.
///
/// Always answers 200; a failing dependency shows up as `"degraded"`.
pub async fn check(State(orchestrator): State<Arc<Orchestrator>>) -> Json<HealthStatus> {
    Json(orchestrator.health().await)
}
