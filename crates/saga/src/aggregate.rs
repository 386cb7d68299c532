//! Saga instance driven by its execution events.

use std::time::Duration;

use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::error::InvalidTransition;
use crate::events::SagaEvent;
use crate::state::SagaState;

/// The running record of one saga execution.
///
/// Every transition is an applied [`SagaEvent`]; the instance keeps the
/// step bookkeeping that ends up in [`SagaMetadata`]. Events that do not
/// fit the current [`SagaState`] are refused and leave it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaInstance {
    id: Option<SagaId>,
    saga_type: String,
    idempotency_key: Option<String>,
    state: SagaState,
    executed_steps: Vec<String>,
    compensated_steps: Vec<String>,
    failed_compensations: Vec<String>,
}

impl SagaInstance {
    /// Applies one event if the current state allows it.
    pub fn apply(&mut self, event: SagaEvent) -> Result<(), InvalidTransition> {
        self.check(&event)?;

        match event {
            SagaEvent::SagaStarted(data) => {
                self.id = Some(data.saga_id);
                self.saga_type = data.saga_type;
                self.idempotency_key = data.idempotency_key;
            }
            SagaEvent::StepStarted(_) => {
                self.state = SagaState::Running;
            }
            SagaEvent::StepCompleted(data) => {
                self.executed_steps.push(data.step_name);
            }
            SagaEvent::StepFailed(_) => {}
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::CompensationStepCompleted(data) => {
                self.compensated_steps.push(data.step_name);
            }
            SagaEvent::CompensationStepFailed(data) => {
                // the chain continues; only the record changes
                self.failed_compensations.push(data.step_name);
            }
            SagaEvent::SagaCompleted(_) => {
                self.state = SagaState::Completed;
            }
            SagaEvent::SagaFailed(_) => {
                self.state = SagaState::Failed;
            }
        }
        Ok(())
    }

    fn check(&self, event: &SagaEvent) -> Result<(), InvalidTransition> {
        let state = self.state;
        let allowed = !state.is_terminal()
            && match event {
                SagaEvent::SagaStarted(_) => state.can_run() && self.id.is_none(),
                SagaEvent::StepStarted(_) => state.can_run() || state == SagaState::Running,
                SagaEvent::StepCompleted(_) | SagaEvent::StepFailed(_) => {
                    state == SagaState::Running
                }
                SagaEvent::CompensationStarted(_) => state.can_compensate(),
                SagaEvent::CompensationStepCompleted(_)
                | SagaEvent::CompensationStepFailed(_)
                | SagaEvent::SagaFailed(_) => state == SagaState::Compensating,
                // a saga without steps completes straight from pending
                SagaEvent::SagaCompleted(_) => state.can_run() || state == SagaState::Running,
            };

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                state,
                event: event.event_type(),
            })
        }
    }

    /// Snapshot of the bookkeeping returned to callers.
    pub fn metadata(&self, duration: Duration) -> SagaMetadata {
        SagaMetadata {
            saga_id: self.id.unwrap_or_default(),
            saga_type: self.saga_type.clone(),
            state: self.state,
            executed_steps: self.executed_steps.clone(),
            compensated_steps: self.compensated_steps.clone(),
            duration_ms: duration.as_millis() as u64,
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

// Query methods
impl SagaInstance {
    pub fn id(&self) -> Option<SagaId> {
        self.id
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Forward steps that completed, in execution order.
    pub fn executed_steps(&self) -> &[String] {
        &self.executed_steps
    }

    /// Steps whose compensation succeeded, in compensation order.
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Steps whose compensation failed after every attempt.
    pub fn failed_compensations(&self) -> &[String] {
        &self.failed_compensations
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

/// Saga bookkeeping attached to a successful composite result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaMetadata {
    pub saga_id: SagaId,
    pub saga_type: String,
    pub state: SagaState,
    pub executed_steps: Vec<String>,
    pub compensated_steps: Vec<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}
