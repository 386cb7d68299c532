//! In-memory transport for tests and standalone mode.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{RemoteError, Result};
use crate::transport::Transport;

type Handler = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Requests and events kept by a transport built with [`InMemoryTransport::new`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 4096;

/// A request observed by the in-memory transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub pattern: String,
    pub payload: Value,
}

struct InMemoryTransportState {
    handlers: HashMap<String, Handler>,
    delays: HashMap<String, Duration>,
    calls: VecDeque<RecordedCall>,
    emitted: VecDeque<(String, Value)>,
    journal_capacity: usize,
    unavailable: bool,
}

/// Appends to a journal, dropping the oldest entry once `capacity` is reached.
fn record<T>(journal: &mut VecDeque<T>, capacity: usize, item: T) {
    if capacity == 0 {
        return;
    }
    if journal.len() == capacity {
        journal.pop_front();
    }
    journal.push_back(item);
}

/// Transport that dispatches requests to closures registered per pattern.
///
/// Requests (including failed ones) and published events go to a bounded
/// journal so tests can assert which upstream calls were issued. Only the
/// most recent `journal_capacity` entries of each are kept.
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<RwLock<InMemoryTransportState>>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::with_journal_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl InMemoryTransport {
    /// Creates a transport with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport keeping at most `capacity` requests and as many
    /// events. A zero capacity disables the journal.
    pub fn with_journal_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTransportState {
                handlers: HashMap::new(),
                delays: HashMap::new(),
                calls: VecDeque::new(),
                emitted: VecDeque::new(),
                journal_capacity: capacity,
                unavailable: false,
            })),
        }
    }

    /// Registers the handler answering requests on `pattern`, replacing any previous one.
    pub fn register<F>(&self, pattern: impl AsRef<str>, handler: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.write()
            .handlers
            .insert(pattern.as_ref().to_string(), Arc::new(handler));
    }

    /// Delays every reply on `pattern` by `delay`.
    pub fn set_delay(&self, pattern: impl AsRef<str>, delay: Duration) {
        self.write()
            .delays
            .insert(pattern.as_ref().to_string(), delay);
    }

    /// Makes every request and ping fail as if the broker were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Returns the retained requests, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.read().calls.iter().cloned().collect()
    }

    /// Returns the payloads received on `pattern`, in order.
    pub fn calls_to(&self, pattern: impl AsRef<str>) -> Vec<Value> {
        let pattern = pattern.as_ref();
        self.read()
            .calls
            .iter()
            .filter(|c| c.pattern == pattern)
            .map(|c| c.payload.clone())
            .collect()
    }

    /// Returns the number of requests received on `pattern`.
    pub fn call_count(&self, pattern: impl AsRef<str>) -> usize {
        let pattern = pattern.as_ref();
        self.read()
            .calls
            .iter()
            .filter(|c| c.pattern == pattern)
            .count()
    }

    /// Returns the number of retained requests.
    pub fn total_calls(&self) -> usize {
        self.read().calls.len()
    }

    /// Returns the retained published events, oldest first.
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.read().emitted.iter().cloned().collect()
    }

    // A panicking handler poisons the lock; the recorded state stays usable.
    fn read(&self) -> RwLockReadGuard<'_, InMemoryTransportState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryTransportState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, pattern: &str, payload: Value) -> Result<Value> {
        let (handler, delay) = {
            let mut state = self.write();
            let capacity = state.journal_capacity;
            let call = RecordedCall {
                pattern: pattern.to_string(),
                payload: payload.clone(),
            };
            record(&mut state.calls, capacity, call);
            if state.unavailable {
                return Err(RemoteError::unavailable(pattern, "broker connection refused"));
            }
            (
                state.handlers.get(pattern).cloned(),
                state.delays.get(pattern).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match handler {
            Some(handler) => handler(payload),
            None => Err(RemoteError::unavailable(pattern, "no handler registered")),
        }
    }

    async fn emit(&self, pattern: &str, payload: Value) -> Result<()> {
        let mut state = self.write();
        if state.unavailable {
            return Err(RemoteError::unavailable(pattern, "broker connection refused"));
        }
        let capacity = state.journal_capacity;
        record(&mut state.emitted, capacity, (pattern.to_string(), payload));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.read().unavailable {
            return Err(RemoteError::unavailable("ping", "broker connection refused"));
        }
        Ok(())
    }
}
