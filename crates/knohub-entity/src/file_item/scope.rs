//! Sibling scope key.

use serde::{Deserialize, Serialize};

use knohub_core::types::{FileItemId, ResourceId};

/// The `(resource, parent)` pair that groups sibling items.
///
/// Name uniqueness, display order, and delete sequences are all scoped by
/// this key. `Ord` gives a canonical lock acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiblingScope {
    pub resource_id: ResourceId,
    pub parent_id: Option<FileItemId>,
}

impl SiblingScope {
    pub fn new(resource_id: ResourceId, parent_id: Option<FileItemId>) -> Self {
        Self {
            resource_id,
            parent_id,
        }
    }

    /// Scope of the resource's root level.
    pub fn root(resource_id: ResourceId) -> Self {
        Self::new(resource_id, None)
    }
}
