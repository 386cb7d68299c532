//! Composition error types.

use rpc::RemoteError;
use thiserror::Error;

/// Errors that can occur while assembling a composite read.
#[derive(Debug, Error)]
pub enum CompositionError {
    /// The primary entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// A call essential to the primary entity failed.
    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Result type for composition operations.
pub type Result<T> = std::result::Result<T, CompositionError>;
