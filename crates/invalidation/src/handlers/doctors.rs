//! Doctor profile events.

use cache::keys;
use domain::DomainEvent;

use crate::handler::{EventHandler, InvalidationTarget, change_targets};

/// Invalidates the doctor composite and every cached doctor list page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoctorCacheHandler;

impl EventHandler for DoctorCacheHandler {
    fn name(&self) -> &'static str {
        "DoctorCacheHandler"
    }

    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget> {
        match event {
            DomainEvent::Doctor(kind, payload) => {
                change_targets(keys::DOCTORS, *kind, payload.id.as_deref())
            }
            _ => Vec::new(),
        }
    }
}
