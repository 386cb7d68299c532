//! Event endpoint: `POST /events/{name}`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use invalidation::{InvalidationReport, InvalidationTarget};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::rpc::parse_body;
use crate::service::Orchestrator;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAccepted {
    pub event: String,
    pub invalidated: Vec<String>,
    pub removed: usize,
    pub failed: Vec<String>,
}

impl From<InvalidationReport> for EventAccepted {
    fn from(report: InvalidationReport) -> Self {
        Self {
            event: report.event.to_string(),
            invalidated: names(&report.targets),
            removed: report.removed,
            failed: names(&report.failed),
        }
    }
}

fn names(targets: &[InvalidationTarget]) -> Vec<String> {
    targets.iter().map(|t| t.as_str().to_string()).collect()
}

/// POST /events/{name}: applies an entity-change event to the cache.
///
/// Accepts enveloped (`{timestamp, data}`) and raw payloads. Answers 202
/// once the event decodes, even when cache invalidation failed.
#[tracing::instrument(skip(orchestrator, body))]
pub async fn receive(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<EventAccepted>), ApiError> {
    let raw = parse_body(&body)?;
    let report = orchestrator.handle_event(&name, raw).await?;
    Ok((StatusCode::ACCEPTED, Json(report.into())))
}
