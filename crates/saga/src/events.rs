//! Saga execution events.
//!
//! The engine records one event per transition; [`SagaInstance`](crate::SagaInstance)
//! checks each against its state and yields the metadata returned to callers.

use chrono::{DateTime, Utc};
use common::SagaId;
use serde::{Deserialize, Serialize};

/// Events that can occur during saga execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started.
    SagaStarted(SagaStartedData),

    /// A forward step was dispatched.
    StepStarted(StepData),

    /// A forward step completed successfully.
    StepCompleted(StepData),

    /// A forward step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// A compensation completed successfully.
    CompensationStepCompleted(StepData),

    /// A compensation failed (logged, compensation continues).
    CompensationStepFailed(StepFailedData),

    /// Saga completed successfully.
    SagaCompleted(SagaFinishedData),

    /// Saga failed after compensation.
    SagaFailed(SagaFinishedData),
}

impl SagaEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SagaEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
            SagaEvent::SagaFailed(_) => "SagaFailed",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaStartedData {
    pub saga_id: SagaId,
    /// The kind of saga (e.g. "DoctorCreation").
    pub saga_type: String,
    pub idempotency_key: Option<String>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    pub step_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailedData {
    pub step_name: String,
    /// Error message describing the failure.
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationData {
    /// The step whose failure triggered compensation.
    pub from_step: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaFinishedData {
    pub finished_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    pub fn saga_started(
        saga_id: SagaId,
        saga_type: impl Into<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_id,
            saga_type: saga_type.into(),
            idempotency_key,
            started_at: Utc::now(),
        })
    }

    pub fn step_started(step_name: impl Into<String>) -> Self {
        SagaEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    pub fn step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::StepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    pub fn step_failed(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    pub fn compensation_started(from_step: impl Into<String>) -> Self {
        SagaEvent::CompensationStarted(CompensationData {
            from_step: from_step.into(),
        })
    }

    pub fn compensation_step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::CompensationStepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    pub fn compensation_step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        SagaEvent::CompensationStepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    pub fn saga_completed() -> Self {
        SagaEvent::SagaCompleted(SagaFinishedData {
            finished_at: Utc::now(),
        })
    }

    pub fn saga_failed() -> Self {
        SagaEvent::SagaFailed(SagaFinishedData {
            finished_at: Utc::now(),
        })
    }
}
