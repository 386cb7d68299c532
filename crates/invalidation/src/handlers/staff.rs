//! Staff account events.
//!
//! Accounts are embedded in doctor composites and blog author fields, and
//! composites are keyed by doctor or post id rather than account id, so a
//! staff change clears every doctor entry and every blog list page.

use cache::keys;
use domain::DomainEvent;

use crate::handler::{EventHandler, InvalidationTarget, change_targets};

#[derive(Debug, Clone, Copy, Default)]
pub struct StaffCacheHandler;

impl EventHandler for StaffCacheHandler {
    fn name(&self) -> &'static str {
        "StaffCacheHandler"
    }

    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget> {
        match event {
            DomainEvent::Staff(kind, payload) => {
                let mut targets = change_targets(keys::STAFF, *kind, payload.id.as_deref());
                targets.push(InvalidationTarget::Pattern(format!("{}:*", keys::DOCTORS)));
                targets.push(InvalidationTarget::Pattern(keys::list_pattern(keys::BLOGS)));
                targets
            }
            _ => Vec::new(),
        }
    }
}
