//! Stateless composition helpers shared by the read composer and the saga engine.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use crate::pagination::PaginationMeta;

/// Builds a lookup table keyed by `key_fn`. Later items win on duplicate keys.
pub fn to_map<T, K, F>(items: impl IntoIterator<Item = T>, key_fn: F) -> HashMap<K, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut map = HashMap::new();
    for item in items {
        map.insert(key_fn(&item), item);
    }
    map
}

/// Left-joins `primary` with `secondary`.
///
/// Every primary item produces exactly one output item; secondary items
/// without a primary match are dropped. `merge` receives `None` when a
/// primary item has no secondary counterpart.
pub fn merge_arrays_by_key<P, S, K, O, FP, FS, M>(
    primary: Vec<P>,
    secondary: Vec<S>,
    primary_key_fn: FP,
    secondary_key_fn: FS,
    merge: M,
) -> Vec<O>
where
    K: Eq + Hash,
    FP: Fn(&P) -> K,
    FS: Fn(&S) -> K,
    M: Fn(P, Option<&S>) -> O,
{
    let lookup = to_map(secondary, secondary_key_fn);
    primary
        .into_iter()
        .map(|item| {
            let key = primary_key_fn(&item);
            merge(item, lookup.get(&key))
        })
        .collect()
}

/// Splits `items` into contiguous chunks of `batch_size`; the last may be shorter.
///
/// A `batch_size` of zero is treated as one.
pub fn batch_array<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Backoff before the attempt following `attempt` (1-indexed): `delay * 2^(attempt-1)`.
pub fn backoff_delay(delay: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    delay.saturating_mul(factor)
}

/// Runs `operation` up to `max_retries` times, sleeping with exponential
/// backoff between attempts. Any error is retried; the last one is returned
/// once the attempts are exhausted.
pub async fn retry<T, E, F, Fut>(
    mut operation: F,
    max_retries: u32,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_retries = max_retries.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_retries => return Err(err),
            Err(err) => {
                let wait = backoff_delay(delay, attempt);
                tracing::debug!(attempt, max_retries, ?wait, error = %err, "retrying operation");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Derives page metadata from a page number, page size and total item count.
pub fn create_pagination_meta(page: u32, limit: u32, total: u64) -> PaginationMeta {
    let total_pages = total.div_ceil(u64::from(limit.max(1)));
    PaginationMeta {
        page,
        limit,
        total,
        total_pages,
        has_next: u64::from(page) < total_pages,
        has_prev: page > 1,
    }
}
