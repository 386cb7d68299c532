//! Saga engine for multi-step writes across services.
//!
//! A saga is an ordered list of [`Step`]s. The [`SagaCoordinator`] runs
//! them strictly in order; when one fails, the compensations captured by
//! the steps that already ran are executed in reverse order, and the
//! caller receives a single [`SagaOrchestrationError`].
//!
//! The doctor creation saga follows these steps:
//! 1. Create the staff account
//! 2. Create the doctor profile for that account

pub mod aggregate;
pub mod coordinator;
pub mod doctor_creation;
pub mod error;
pub mod events;
pub mod state;
pub mod step;

pub use aggregate::{SagaInstance, SagaMetadata};
pub use coordinator::{SagaConfig, SagaCoordinator, SagaOutcome};
pub use doctor_creation::{DoctorCreated, DoctorCreationSaga};
pub use error::{InvalidTransition, Result, SagaOrchestrationError};
pub use events::SagaEvent;
pub use state::SagaState;
pub use step::{CallCompensation, Compensation, Step, StepResult};
