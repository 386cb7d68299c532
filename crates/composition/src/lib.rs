//! Read composition engine.
//!
//! [`ReadComposer`] answers composite queries by fanning out to the owning
//! services, joining the replies on their shared identifiers and caching the
//! assembled result:
//! - doctor composite: profile + staff account + specialty names
//! - doctor list composite: a page of profiles joined with accounts and specialties
//! - blog list composite: a page of posts joined with their authors
//!
//! The primary entity is essential; enrichment calls degrade to partial data.

pub mod blogs;
pub mod composer;
pub mod doctors;
pub mod error;

pub use composer::{ComposerConfig, ReadComposer};
pub use error::{CompositionError, Result};
