//! API error types with HTTP response mapping.
//!
//! Every failure leaves the service as one JSON object:
//! `{statusCode, error, message, details?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cache::CacheError;
use composition::CompositionError;
use domain::DomainError;
use invalidation::InvalidationError;
use rpc::RemoteError;
use rpc::error::reason_phrase;
use saga::SagaOrchestrationError;
use serde::Serialize;
use serde_json::{Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Unknown command pattern.
    UnknownPattern(String),
    /// Upstream call failed.
    Remote(RemoteError),
    /// Composite read failed.
    Composition(CompositionError),
    /// Saga failed and was compensated.
    Saga(SagaOrchestrationError),
    /// Cache unreachable, or a bad pattern, during an explicit cache command.
    Cache(CacheError),
    /// Internal server error.
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            error: reason_phrase(status_code).to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl ApiError {
    /// Builds the wire body for this error.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(msg) => ErrorBody::new(400, msg.clone()),
            ApiError::UnknownPattern(pattern) => {
                ErrorBody::new(404, format!("Unknown pattern: {pattern}"))
            }
            ApiError::Remote(err) => remote_error_body(err),
            ApiError::Composition(err @ CompositionError::NotFound { .. }) => {
                ErrorBody::new(404, err.to_string())
            }
            ApiError::Composition(CompositionError::Remote(err)) => remote_error_body(err),
            ApiError::Saga(err) => saga_error_body(err),
            ApiError::Cache(err @ CacheError::InvalidPattern(_)) => {
                ErrorBody::new(400, err.to_string())
            }
            ApiError::Cache(err) => ErrorBody::new(503, err.to_string()),
            ApiError::Internal(msg) => ErrorBody::new(500, msg.clone()),
        }
    }
}

fn remote_error_body(err: &RemoteError) -> ErrorBody {
    let status = err.status_code();
    match err {
        RemoteError::Rejected {
            error,
            message,
            details,
            ..
        } => ErrorBody {
            status_code: status,
            error: error.clone(),
            message: message.clone(),
            details: details.clone(),
        },
        _ => ErrorBody::new(status, err.to_string()),
    }
}

fn saga_error_body(err: &SagaOrchestrationError) -> ErrorBody {
    let mut details = json!({
        "sagaError": true,
        "sagaId": err.saga_id,
        "sagaType": err.saga_type,
        "step": err.step,
        "executedSteps": err.executed_steps,
        "compensatedSteps": err.compensated_steps,
        "durationMs": err.duration_ms,
        "originalError": remote_error_body(&err.cause),
    });
    if !err.failed_compensations.is_empty() {
        details["failedCompensations"] = json!(err.failed_compensations);
    }

    let message = match &err.cause {
        RemoteError::Rejected { message, .. } => message.clone(),
        cause => cause.to_string(),
    };
    ErrorBody::new(err.status_code(), message).with_details(details)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.to_body();
        if body.status_code >= 500 {
            tracing::error!(status = body.status_code, error = %body.message, "request failed");
        } else {
            tracing::debug!(status = body.status_code, error = %body.message, "request rejected");
        }

        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnknownPattern(pattern) => ApiError::UnknownPattern(pattern),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        ApiError::Remote(err)
    }
}

impl From<CompositionError> for ApiError {
    fn from(err: CompositionError) -> Self {
        ApiError::Composition(err)
    }
}

impl From<SagaOrchestrationError> for ApiError {
    fn from(err: SagaOrchestrationError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::Cache(err)
    }
}

impl From<InvalidationError> for ApiError {
    fn from(err: InvalidationError) -> Self {
        match err {
            InvalidationError::Decode(e) => e.into(),
            InvalidationError::Cache(e) => ApiError::Cache(e),
        }
    }
}
