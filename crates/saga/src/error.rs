//! Saga error types.

use common::SagaId;
use rpc::RemoteError;
use thiserror::Error;

use crate::state::SagaState;

/// An event that is not legal in the saga's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event} is not allowed while the saga is {state}")]
pub struct InvalidTransition {
    pub state: SagaState,
    pub event: &'static str,
}

/// Terminal error of a saga whose forward phase failed.
///
/// Raised only after compensation has run. The upstream failure is kept as
/// [`cause`](Self::cause); the other fields describe how far the saga got
/// and what was undone.
#[derive(Debug, Clone, Error)]
#[error("Saga {saga_type} ({saga_id}) failed at step '{step}': {cause}")]
pub struct SagaOrchestrationError {
    pub saga_id: SagaId,
    pub saga_type: String,
    /// Name of the failing step.
    pub step: String,
    /// Forward steps that completed before the failure, in order.
    pub executed_steps: Vec<String>,
    /// Steps successfully compensated, in compensation order.
    pub compensated_steps: Vec<String>,
    /// Steps whose compensation failed after every attempt.
    pub failed_compensations: Vec<String>,
    pub duration_ms: u64,
    #[source]
    pub cause: RemoteError,
}

impl SagaOrchestrationError {
    /// Status code of the failing step's cause.
    pub fn status_code(&self) -> u16 {
        self.cause.status_code()
    }

    /// True when the forward phase was cut short by a timeout, either a
    /// per-call timeout or the saga deadline.
    pub fn is_timeout(&self) -> bool {
        self.cause.is_timeout()
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaOrchestrationError>;
