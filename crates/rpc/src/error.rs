//! Remote call error types.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by remote calls.
///
/// Transport failures ([`Timeout`](Self::Timeout),
/// [`Unavailable`](Self::Unavailable),
/// [`RetriesExhausted`](Self::RetriesExhausted)) are retryable and let
/// callers degrade gracefully. [`Rejected`](Self::Rejected) carries the
/// upstream business error and is never retried.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// No reply arrived within the call timeout.
    #[error("Call to '{pattern}' timed out after {timeout_ms}ms")]
    Timeout { pattern: String, timeout_ms: u64 },

    /// The broker or the target service could not be reached.
    #[error("Service for '{pattern}' unavailable: {reason}")]
    Unavailable { pattern: String, reason: String },

    /// The target service processed the request and refused it.
    #[error("'{pattern}' rejected with {status_code} {error}: {message}")]
    Rejected {
        pattern: String,
        status_code: u16,
        error: String,
        message: String,
        details: Option<Value>,
    },

    /// The request could not be encoded or the reply could not be decoded.
    #[error("Invalid payload for '{pattern}': {reason}")]
    InvalidPayload { pattern: String, reason: String },

    /// Every retry attempt failed with a transport error.
    #[error("'{pattern}' still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        pattern: String,
        attempts: u32,
        last: Box<RemoteError>,
    },
}

impl RemoteError {
    pub fn unavailable(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        RemoteError::Unavailable {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(pattern: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            pattern: pattern.into(),
            status_code,
            error: reason_phrase(status_code).to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::rejected(pattern, 404, message)
    }

    /// The pattern the failing call was sent on.
    pub fn pattern(&self) -> &str {
        match self {
            RemoteError::Timeout { pattern, .. }
            | RemoteError::Unavailable { pattern, .. }
            | RemoteError::Rejected { pattern, .. }
            | RemoteError::InvalidPayload { pattern, .. }
            | RemoteError::RetriesExhausted { pattern, .. } => pattern,
        }
    }

    /// True for failures where the service never answered.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::Timeout { .. }
                | RemoteError::Unavailable { .. }
                | RemoteError::RetriesExhausted { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            RemoteError::Timeout { .. } => true,
            RemoteError::RetriesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Rejected { status_code: 404, .. })
    }

    /// HTTP-style status code describing the failure.
    pub fn status_code(&self) -> u16 {
        match self {
            RemoteError::Rejected { status_code, .. } => *status_code,
            RemoteError::InvalidPayload { .. } => 502,
            _ if self.is_timeout() => 504,
            _ => 503,
        }
    }
}

/// Canonical reason phrase for the status codes upstream services return.
pub fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Internal Server Error",
    }
}

/// Convenience type alias for remote call results.
pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_vs_business_classification() {
        let timeout = RemoteError::Timeout {
            pattern: "accounts.staff.create".into(),
            timeout_ms: 10_000,
        };
        let rejected = RemoteError::rejected("accounts.staff.create", 409, "email taken");

        assert!(timeout.is_transport());
        assert!(!rejected.is_transport());
        assert_eq!(timeout.status_code(), 504);
        assert_eq!(rejected.status_code(), 409);
    }

    #[test]
    fn test_exhausted_keeps_timeout_status() {
        let err = RemoteError::RetriesExhausted {
            pattern: "p".into(),
            attempts: 3,
            last: Box::new(RemoteError::Timeout {
                pattern: "p".into(),
                timeout_ms: 5,
            }),
        };
        assert!(err.is_transport());
        assert!(err.is_timeout());
        assert_eq!(err.status_code(), 504);

        let err = RemoteError::RetriesExhausted {
            pattern: "p".into(),
            attempts: 3,
            last: Box::new(RemoteError::unavailable("p", "connection refused")),
        };
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_not_found_helper() {
        let err = RemoteError::not_found("provider.doctor.findOne", "Doctor d1 not found");
        assert!(err.is_not_found());
        assert_eq!(err.pattern(), "provider.doctor.findOne");
        assert!(err.to_string().contains("404 Not Found"));
    }
}
