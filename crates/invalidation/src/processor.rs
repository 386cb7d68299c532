//! Invalidation processor for feeding events to handlers.

use std::sync::Arc;

use cache::CacheStore;
use domain::{DecodedEvent, EventName};
use serde_json::Value;

use crate::Result;
use crate::handler::{EventHandler, InvalidationTarget};
use crate::handlers::default_handlers;

/// What one processed event invalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationReport {
    pub event: EventName,
    /// Every target attempted, deduplicated across handlers, in order.
    pub targets: Vec<InvalidationTarget>,
    /// Number of cache entries actually removed.
    pub removed: usize,
    /// Targets whose invalidation failed (logged, not raised).
    pub failed: Vec<InvalidationTarget>,
}

/// Delivers decoded events to every registered handler and applies the
/// resulting invalidations to the cache.
///
/// Cache failures never fail event processing: each target is attempted
/// independently, and failures are logged and counted. Only an undecodable
/// event is reported as an error.
pub struct InvalidationProcessor {
    cache: Arc<dyn CacheStore>,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl InvalidationProcessor {
    /// Creates a processor with no handlers.
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            cache,
            handlers: Vec::new(),
        }
    }

    /// Creates a processor with every built-in handler registered.
    pub fn with_default_handlers(cache: Arc<dyn CacheStore>) -> Self {
        let mut processor = Self::new(cache);
        for handler in default_handlers() {
            processor.register(handler);
        }
        processor
    }

    /// Registers a handler with this processor.
    pub fn register(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Decodes a wire event (enveloped or raw) and processes it.
    #[tracing::instrument(skip(self, raw))]
    pub async fn process_raw(&self, name: &str, raw: Value) -> Result<InvalidationReport> {
        let event = DecodedEvent::decode(name, raw)?;
        Ok(self.process(&event).await)
    }

    /// Delivers a single event to all registered handlers.
    ///
    /// Every invalidation has been attempted by the time this returns.
    #[tracing::instrument(skip(self, event), fields(event = %event.event.name()))]
    pub async fn process(&self, event: &DecodedEvent) -> InvalidationReport {
        let name = event.event.name();
        metrics::counter!("invalidation_events_total", "event" => name.as_str()).increment(1);

        let mut report = InvalidationReport {
            event: name,
            targets: Vec::new(),
            removed: 0,
            failed: Vec::new(),
        };

        for handler in &self.handlers {
            for target in handler.targets(&event.event) {
                if report.targets.contains(&target) {
                    continue;
                }
                match self.invalidate(&target).await {
                    Ok(removed) => report.removed += removed,
                    Err(e) => {
                        tracing::warn!(handler = handler.name(), %target, error = %e, "cache invalidation failed");
                        metrics::counter!("invalidation_errors_total", "event" => name.as_str())
                            .increment(1);
                        report.failed.push(target.clone());
                    }
                }
                report.targets.push(target);
            }
        }

        tracing::debug!(
            targets = report.targets.len(),
            removed = report.removed,
            failed = report.failed.len(),
            "event processed"
        );
        report
    }

    async fn invalidate(&self, target: &InvalidationTarget) -> Result<usize> {
        let removed = match target {
            InvalidationTarget::Key(key) => usize::from(self.cache.invalidate(key).await?),
            InvalidationTarget::Pattern(pattern) => self.cache.invalidate_pattern(pattern).await?,
        };
        Ok(removed)
    }
}
