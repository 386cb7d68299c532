//! Command endpoint: `POST /rpc/{pattern}`.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::OrchestratorPattern;
use serde_json::Value;

use crate::error::ApiError;
use crate::service::Orchestrator;

/// POST /rpc/{pattern}: dispatches one orchestrator command.
///
/// The body is the command payload; an empty body is treated as `{}`.
/// `orchestrator.doctor.create` answers 201, every other command 200.
#[tracing::instrument(skip(orchestrator, body))]
pub async fn dispatch(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(pattern): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pattern: OrchestratorPattern = pattern.parse()?;
    let payload = parse_body(&body)?;

    let reply = orchestrator.dispatch(pattern, payload).await?;

    let status = match pattern {
        OrchestratorPattern::DoctorCreate => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(reply)))
}

pub(crate) fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))
}
