//! Typed remote call client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::helpers::backoff_delay;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RemoteError, Result};
use crate::transport::Transport;

/// Per-call timeout applied when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for a single remote call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Bounded retry schedule for transport failures.
///
/// `max_retries` counts total attempts; the wait after attempt `n` is
/// `delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Sends typed requests over a [`Transport`].
#[derive(Clone)]
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
}

impl RemoteClient {
    /// Creates a client with the default 10 second timeout.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the timeout used by calls without an explicit one.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Sends `payload` on `pattern` and decodes the reply.
    pub async fn call<Req, Resp>(&self, pattern: impl AsRef<str>, payload: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.call_with_options(pattern, payload, CallOptions::default())
            .await
    }

    /// Like [`call`](Self::call) with explicit options.
    #[tracing::instrument(skip(self, pattern, payload, options), fields(pattern = pattern.as_ref()))]
    pub async fn call_with_options<Req, Resp>(
        &self,
        pattern: impl AsRef<str>,
        payload: &Req,
        options: CallOptions,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let pattern = pattern.as_ref();
        let body = encode(pattern, payload)?;
        let reply = self.send_raw(pattern, body, options).await?;
        serde_json::from_value(reply).map_err(|e| RemoteError::InvalidPayload {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }

    /// Calls `pattern`, retrying transport failures under `policy`.
    ///
    /// Rejections and payload errors return immediately. When every attempt
    /// fails with a transport error, the last one is wrapped in
    /// [`RemoteError::RetriesExhausted`].
    #[tracing::instrument(skip(self, pattern, payload, policy), fields(pattern = pattern.as_ref()))]
    pub async fn call_with_retry<Req, Resp>(
        &self,
        pattern: impl AsRef<str>,
        payload: &Req,
        policy: RetryPolicy,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let pattern = pattern.as_ref();
        let max_retries = policy.max_retries.max(1);
        let mut attempt = 1;
        loop {
            match self
                .call_with_options(pattern, payload, CallOptions::default())
                .await
            {
                Ok(reply) => return Ok(reply),
                Err(err) if !err.is_transport() => return Err(err),
                Err(err) if attempt >= max_retries => {
                    tracing::warn!(attempts = attempt, error = %err, "remote call retries exhausted");
                    return Err(RemoteError::RetriesExhausted {
                        pattern: pattern.to_string(),
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let wait = backoff_delay(policy.delay, attempt);
                    tracing::debug!(attempt, ?wait, error = %err, "retrying remote call");
                    metrics::counter!("rpc_retries_total", "pattern" => pattern.to_string())
                        .increment(1);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Publishes an event without waiting for consumers.
    pub async fn emit<P>(&self, pattern: impl AsRef<str>, payload: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let pattern = pattern.as_ref();
        let body = encode(pattern, payload)?;
        self.transport.emit(pattern, body).await
    }

    /// Checks broker reachability within the default timeout.
    pub async fn ping(&self) -> Result<()> {
        match tokio::time::timeout(self.default_timeout, self.transport.ping()).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                pattern: "ping".to_string(),
                timeout_ms: self.default_timeout.as_millis() as u64,
            }),
        }
    }

    async fn send_raw(&self, pattern: &str, body: Value, options: CallOptions) -> Result<Value> {
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let started = Instant::now();
        metrics::counter!("rpc_calls_total", "pattern" => pattern.to_string()).increment(1);

        let result = match tokio::time::timeout(timeout, self.transport.send(pattern, body)).await
        {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("rpc_timeouts_total", "pattern" => pattern.to_string())
                    .increment(1);
                Err(RemoteError::Timeout {
                    pattern: pattern.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        metrics::histogram!("rpc_call_duration_seconds", "pattern" => pattern.to_string())
            .record(started.elapsed().as_secs_f64());
        if let Err(err) = &result {
            tracing::debug!(error = %err, "remote call failed");
        }
        result
    }
}

fn encode<P: Serialize + ?Sized>(pattern: &str, payload: &P) -> Result<Value> {
    serde_json::to_value(payload).map_err(|e| RemoteError::InvalidPayload {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
