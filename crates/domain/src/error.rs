//! Domain error types.

use thiserror::Error;

/// Errors raised while decoding wire-level identifiers and payloads.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The command pattern is not one the orchestrator serves.
    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    /// The event name is not one the orchestrator consumes.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// The payload did not match the shape expected for the event.
    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
