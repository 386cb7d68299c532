//! Blog post events.

use cache::keys;
use domain::DomainEvent;

use crate::handler::{EventHandler, InvalidationTarget, change_targets};

#[derive(Debug, Clone, Copy, Default)]
pub struct BlogCacheHandler;

impl EventHandler for BlogCacheHandler {
    fn name(&self) -> &'static str {
        "BlogCacheHandler"
    }

    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget> {
        match event {
            DomainEvent::Blog(kind, payload) => {
                change_targets(keys::BLOGS, *kind, payload.id.as_deref())
            }
            _ => Vec::new(),
        }
    }
}
