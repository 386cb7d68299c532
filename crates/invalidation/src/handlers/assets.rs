//! Asset events: uploaded files attached to other entities.

use cache::keys;
use domain::{ChangeKind, DomainEvent};

use crate::handler::{EventHandler, InvalidationTarget, change_targets, entity_target};

/// Invalidates asset items, asset lists and the per-entity asset listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetCacheHandler;

impl EventHandler for AssetCacheHandler {
    fn name(&self) -> &'static str {
        "AssetCacheHandler"
    }

    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget> {
        match event {
            DomainEvent::Asset(kind, payload) => {
                let mut targets = change_targets(keys::ASSETS, *kind, payload.id.as_deref());
                targets.extend(entity_target(
                    keys::ASSETS,
                    payload.entity_type.as_deref(),
                    payload.entity_id.as_deref(),
                ));
                targets
            }
            DomainEvent::AssetsBulkDeleted(payload) => {
                let mut targets: Vec<InvalidationTarget> = payload
                    .asset_ids
                    .iter()
                    .map(|id| InvalidationTarget::Key(keys::item(keys::ASSETS, id)))
                    .collect();
                targets.extend(entity_target(
                    keys::ASSETS,
                    payload.entity_type.as_deref(),
                    payload.entity_id.as_deref(),
                ));
                targets.push(InvalidationTarget::Pattern(keys::list_pattern(keys::ASSETS)));
                targets
            }
            _ => Vec::new(),
        }
    }
}
