use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// Core trait for cache backends.
///
/// All callers share one logical store: an invalidation is visible to every
/// subsequent `get`. Operations are independent; there is no transaction
/// spanning several invalidations.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` on a miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`. A zero `ttl` stores without expiry.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Removes a single exact key. Returns whether an entry was removed.
    async fn invalidate(&self, key: &str) -> Result<bool>;

    /// Removes every key matching a glob pattern (`*`, `?`, `[...]`).
    /// Returns the number of removed entries.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Extension trait providing typed access on top of JSON values.
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Reads and decodes a cached value.
    async fn get_typed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encodes and stores a value.
    async fn set_typed<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl).await
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}
