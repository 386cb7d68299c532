//! Event-driven cache invalidation for composed reads.
//!
//! This crate keeps cached composites consistent with upstream writes:
//! - [`EventHandler`] maps a domain event to the cache entries it makes stale
//! - [`InvalidationProcessor`] decodes events, runs every handler and
//!   applies the invalidations, absorbing cache failures
//! - Five handlers: assets, doctors, staff accounts, appointments, blog posts

pub mod error;
pub mod handler;
pub mod handlers;
pub mod processor;

pub use error::{InvalidationError, Result};
pub use handler::{EventHandler, InvalidationTarget};
pub use handlers::{
    AppointmentCacheHandler, AssetCacheHandler, BlogCacheHandler, DoctorCacheHandler,
    StaffCacheHandler, default_handlers,
};
pub use processor::{InvalidationProcessor, InvalidationReport};
