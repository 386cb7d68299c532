use thiserror::Error;

/// Errors that can occur when interacting with the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend could not be reached.
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// An invalidation pattern is not a valid glob.
    #[error("Invalid cache pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// A cached value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
