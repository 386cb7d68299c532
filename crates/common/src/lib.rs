//! Shared types and stateless helpers used across the orchestrator crates.
//!
//! - [`SagaId`] identifies a single saga execution
//! - [`PaginationMeta`] and [`PaginatedResponse`] describe paged composite reads
//! - [`helpers`] holds the pure composition utilities (maps, joins, batching, retry)

pub mod helpers;
pub mod pagination;
pub mod types;

pub use helpers::{batch_array, create_pagination_meta, merge_arrays_by_key, retry, to_map};
pub use pagination::{PageQuery, PaginatedResponse, PaginationMeta};
pub use types::SagaId;
