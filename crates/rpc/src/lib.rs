//! Remote call client for the orchestrator.
//!
//! Every cross-service interaction goes through [`RemoteClient`]:
//! - [`RemoteClient::call`] sends a typed request and decodes the typed reply,
//!   bounded by a per-call timeout
//! - [`RemoteClient::call_with_retry`] retries transport failures (timeout,
//!   unavailable) with exponential backoff and never retries rejections
//! - [`Transport`] is the seam to the broker; [`InMemoryTransport`] serves
//!   tests and standalone mode

pub mod client;
pub mod error;
pub mod memory;
pub mod transport;

pub use client::{CallOptions, DEFAULT_TIMEOUT, RemoteClient, RetryPolicy};
pub use error::{RemoteError, Result};
pub use memory::{InMemoryTransport, RecordedCall};
pub use transport::Transport;
