//! Composer shell: configuration, cache-aside flow and degraded enrichment.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cache::{CacheError, CacheStore, CacheStoreExt};
use rpc::{RemoteClient, RemoteError, RetryPolicy};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// Tuning for composite reads.
#[derive(Debug, Clone, Copy)]
pub struct ComposerConfig {
    /// Lifetime of cached composites.
    pub cache_ttl: Duration,
    /// Retry schedule for every upstream read.
    pub retry: RetryPolicy,
    /// Maximum identifiers per batched lookup.
    pub batch_size: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            retry: RetryPolicy::new(3, Duration::from_millis(200)),
            batch_size: 50,
        }
    }
}

/// A composed value plus whether any optional enrichment was skipped.
pub(crate) struct Composed<T> {
    pub value: T,
    pub degraded: bool,
}

/// Assembles composite views from several services.
#[derive(Clone)]
pub struct ReadComposer {
    pub(crate) client: RemoteClient,
    cache: Arc<dyn CacheStore>,
    pub(crate) config: ComposerConfig,
}

impl ReadComposer {
    /// Creates a composer with the default configuration.
    pub fn new(client: RemoteClient, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(client, cache, ComposerConfig::default())
    }

    pub fn with_config(
        client: RemoteClient,
        cache: Arc<dyn CacheStore>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            client,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Cache-aside read of `key`.
    ///
    /// A hit is returned as stored. On a miss, `load` runs and its value is
    /// cached unless it was degraded. Cache failures never fail the read:
    /// they are logged and treated as a miss. A cached value that no longer
    /// decodes is dropped and reloaded.
    pub(crate) async fn cached<T, F, Fut>(&self, key: &str, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Composed<T>>>,
    {
        match self.cache.get_typed::<T>(key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key, "composite cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(CacheError::Serialization(e)) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                if let Err(e) = self.cache.invalidate(key).await {
                    tracing::warn!(key, error = %e, "failed to discard cache entry");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "cache read failed, loading from source"),
        }

        let composed = load().await?;
        if composed.degraded {
            tracing::info!(key, "composite degraded, not caching");
        } else if let Err(e) = self
            .cache
            .set_typed(key, &composed.value, self.config.cache_ttl)
            .await
        {
            tracing::warn!(key, error = %e, "cache write failed");
        }
        Ok(composed.value)
    }
}

/// Resolves an optional enrichment call.
///
/// Rejections (the service answered) yield the default and keep the
/// composite cacheable. Transport failures yield the default and mark the
/// composite degraded so it is not cached.
pub(crate) fn optional<T: Default>(
    what: &'static str,
    result: std::result::Result<T, RemoteError>,
) -> (T, bool) {
    match result {
        Ok(value) => (value, false),
        Err(err) => {
            let degraded = err.is_transport();
            tracing::warn!(enrichment = what, degraded, error = %err, "enrichment failed, continuing with partial data");
            metrics::counter!("composition_degraded_total", "enrichment" => what).increment(1);
            (T::default(), degraded)
        }
    }
}

/// Deduplicates identifiers, keeping first-seen order.
pub(crate) fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
