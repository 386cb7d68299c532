//! Core handler trait and invalidation targets.

use cache::keys;
use domain::{ChangeKind, DomainEvent};

/// A cache entry, or family of entries, made stale by an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidationTarget {
    /// One exact key.
    Key(String),
    /// Every key matching a glob pattern.
    Pattern(String),
}

impl InvalidationTarget {
    pub fn as_str(&self) -> &str {
        match self {
            InvalidationTarget::Key(key) => key,
            InvalidationTarget::Pattern(pattern) => pattern,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, InvalidationTarget::Pattern(_))
    }
}

impl std::fmt::Display for InvalidationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationTarget::Key(key) => write!(f, "key({key})"),
            InvalidationTarget::Pattern(pattern) => write!(f, "pattern({pattern})"),
        }
    }
}

/// Maps domain events to the cache entries they make stale.
///
/// Handlers only decide *what* to invalidate; the
/// [`InvalidationProcessor`](crate::InvalidationProcessor) removes the
/// entries and absorbs cache failures.
pub trait EventHandler: Send + Sync {
    /// Returns the name of this handler.
    fn name(&self) -> &'static str;

    /// Targets made stale by `event`, in invalidation order. Empty when the
    /// event does not concern this handler.
    fn targets(&self, event: &DomainEvent) -> Vec<InvalidationTarget>;
}

/// Shared rule: any change invalidates the resource's lists; updates and
/// deletes also invalidate the item key.
pub(crate) fn change_targets(
    resource: &str,
    kind: ChangeKind,
    id: Option<&str>,
) -> Vec<InvalidationTarget> {
    let mut targets = vec![InvalidationTarget::Pattern(keys::list_pattern(resource))];
    if kind != ChangeKind::Created
        && let Some(id) = id
    {
        targets.push(InvalidationTarget::Key(keys::item(resource, id)));
    }
    targets
}

/// `<resource>:entity:<type>:<id>` when both parts are present.
pub(crate) fn entity_target(
    resource: &str,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
) -> Option<InvalidationTarget> {
    match (entity_type, entity_id) {
        (Some(entity_type), Some(entity_id)) => Some(InvalidationTarget::Key(keys::entity(
            resource,
            entity_type,
            entity_id,
        ))),
        _ => None,
    }
}
