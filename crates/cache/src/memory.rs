use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use glob::Pattern;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::store::CacheStore;
use crate::{CacheError, Result};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// How often `set` sweeps expired entries out of a default store.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct InMemoryCacheState {
    entries: HashMap<String, CacheEntry>,
    sweep_interval: Duration,
    next_sweep: Option<Instant>,
    unavailable: bool,
}

impl InMemoryCacheState {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

/// In-memory cache store.
///
/// An expired entry is dropped by the next `get` or pattern scan that
/// touches it. Keys nobody reads again are dropped by a sweep that `set`
/// runs at most once per sweep interval. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct InMemoryCacheStore {
    state: Arc<RwLock<InMemoryCacheState>>,
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl InMemoryCacheStore {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty cache sweeping expired entries every `interval`.
    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryCacheState {
                entries: HashMap::new(),
                sweep_interval: interval,
                next_sweep: None,
                unavailable: false,
            })),
        }
    }

    /// Drops every expired entry now. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.state.write().await.purge_expired(Instant::now());
        if purged > 0 {
            tracing::debug!(purged, "expired cache entries purged");
        }
        purged
    }

    /// Makes every operation fail as if the backend were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns the number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .await
            .entries
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Returns true if no live entry exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns true if a live entry exists for `key`.
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.state
            .read()
            .await
            .entries
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Returns the live keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .state
            .read()
            .await
            .entries
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Clears all entries.
    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
    }

    fn check_available(state: &InMemoryCacheState) -> Result<()> {
        if state.unavailable {
            return Err(CacheError::Unavailable(
                "in-memory cache marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let expired = match state.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                metrics::counter!("cache_hits_total").increment(1);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.remove(key);
        }

        metrics::counter!("cache_misses_total").increment(1);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        if state.next_sweep.is_none_or(|at| at <= now) {
            let purged = state.purge_expired(now);
            if purged > 0 {
                tracing::debug!(purged, "expired cache entries swept");
            }
            state.next_sweep = Some(now + state.sweep_interval);
        }

        let expires_at = (!ttl.is_zero()).then(|| now + ttl);
        state
            .entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let removed = state.entries.remove(key).is_some();
        metrics::counter!("cache_invalidations_total").increment(1);
        tracing::debug!(key, removed, "cache key invalidated");
        Ok(removed)
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let glob = Pattern::new(pattern)?;
        let now = Instant::now();
        let mut state = self.state.write().await;
        Self::check_available(&state)?;

        let before = state.entries.len();
        let mut removed = 0;
        state.entries.retain(|key, entry| {
            if glob.matches(key) {
                if !entry.is_expired(now) {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });

        metrics::counter!("cache_invalidations_total").increment(1);
        tracing::debug!(pattern, removed, scanned = before, "cache pattern invalidated");
        Ok(removed)
    }

    async fn ping(&self) -> Result<()> {
        let state = self.state.read().await;
        Self::check_available(&state)
    }
}
