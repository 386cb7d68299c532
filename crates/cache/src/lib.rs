//! Cache store for composed reads.
//!
//! - [`CacheStore`] is the backend seam: exact get/set/invalidate plus
//!   glob-pattern invalidation
//! - [`InMemoryCacheStore`] is a TTL-aware in-process backend
//! - [`keys`] builds keys following the `<resource>:<id>`,
//!   `<resource>:entity:<type>:<id>` and `<resource>:list:*` conventions

pub mod error;
pub mod keys;
pub mod memory;
pub mod store;

pub use error::{CacheError, Result};
pub use memory::InMemoryCacheStore;
pub use store::{CacheStore, CacheStoreExt};
