//! Transport seam between the orchestrator and the message broker.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Request/response and fire-and-forget messaging over a broker.
///
/// Implementations report broker-level failures as
/// [`RemoteError::Unavailable`](crate::RemoteError::Unavailable) and
/// relay upstream business failures as
/// [`RemoteError::Rejected`](crate::RemoteError::Rejected). Timeouts are
/// enforced by the client, not the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request on `pattern` and waits for the reply.
    async fn send(&self, pattern: &str, payload: Value) -> Result<Value>;

    /// Publishes an event on `pattern` without waiting for consumers.
    async fn emit(&self, pattern: &str, payload: Value) -> Result<()>;

    /// Checks that the broker is reachable.
    async fn ping(&self) -> Result<()>;
}
