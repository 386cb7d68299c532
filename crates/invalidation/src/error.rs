//! Invalidation error types.

use cache::CacheError;
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur while handling an event.
///
/// Only decoding failures reach callers of the processor; cache failures
/// are logged and counted at the processor boundary.
#[derive(Debug, Error)]
pub enum InvalidationError {
    /// The event name or payload could not be decoded.
    #[error("Event decode error: {0}")]
    Decode(#[from] DomainError),

    /// The cache rejected an invalidation.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type for invalidation operations.
pub type Result<T> = std::result::Result<T, InvalidationError>;
