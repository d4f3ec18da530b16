//! Tree store contract.
//!
//! Every engine operation opens one [`TreeTransaction`], performs all of
//! its reads and writes through it, and commits once. Dropping a
//! transaction without committing discards its writes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use knohub_core::result::AppResult;
use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::{FileItem, SiblingScope};
use knohub_entity::resource::{Resource, ResourceType};

/// Constraint guarding active-name uniqueness per sibling scope.
pub const ACTIVE_NAME_CONSTRAINT: &str = "file_items_active_name_key";

/// Constraint guarding delete-sequence uniqueness per name scope.
pub const DELETE_SEQUENCE_CONSTRAINT: &str = "file_items_delete_sequence_key";

/// Factory for transactional units of work.
#[async_trait]
pub trait TreeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g. `"postgres"`, `"memory"`).
    fn store_type(&self) -> &str;

    async fn health_check(&self) -> AppResult<bool>;

    /// Open a new unit of work.
    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>>;
}

/// Reads and writes scoped to one unit of work.
///
/// "Active" means `deleted = false`. Sibling listings are ordered by
/// `display_order`, ties broken by creation time.
#[async_trait]
pub trait TreeTransaction: Send {
    // ── Resources ────────────────────────────────────────────

    /// Active resource by id.
    async fn find_resource(&mut self, id: ResourceId) -> AppResult<Option<Resource>>;

    /// Active resources, newest first.
    async fn list_resources(&mut self) -> AppResult<Vec<Resource>>;

    /// Active resources of one type, newest first.
    async fn list_resources_by_type(
        &mut self,
        resource_type: ResourceType,
    ) -> AppResult<Vec<Resource>>;

    /// Active resources whose title or description contains `keyword`,
    /// case-insensitively.
    async fn search_resources(&mut self, keyword: &str) -> AppResult<Vec<Resource>>;

    /// Insert or update a resource.
    async fn save_resource(&mut self, resource: &Resource) -> AppResult<()>;

    // ── File items ───────────────────────────────────────────

    /// Item by id regardless of deletion state.
    async fn find_item(&mut self, id: FileItemId) -> AppResult<Option<FileItem>>;

    /// Active item by id.
    async fn find_active_item(&mut self, id: FileItemId) -> AppResult<Option<FileItem>> {
        Ok(self.find_item(id).await?.filter(FileItem::is_active))
    }

    /// Active items of a sibling scope, in display order.
    async fn list_active_in_scope(&mut self, scope: SiblingScope) -> AppResult<Vec<FileItem>>;

    /// Active children of a folder, in display order.
    async fn list_active_children(&mut self, folder: &FileItem) -> AppResult<Vec<FileItem>> {
        self.list_active_in_scope(SiblingScope::new(folder.resource_id, Some(folder.id)))
            .await
    }

    /// Active root-level items of a resource, in display order.
    async fn list_active_roots(&mut self, resource_id: ResourceId) -> AppResult<Vec<FileItem>> {
        self.list_active_in_scope(SiblingScope::root(resource_id))
            .await
    }

    /// Every active item of a resource, in display order within each scope.
    async fn list_active_in_resource(&mut self, resource_id: ResourceId)
    -> AppResult<Vec<FileItem>>;

    /// Active item holding `name` as its original name in `scope`.
    async fn find_active_by_name(
        &mut self,
        scope: SiblingScope,
        name: &str,
    ) -> AppResult<Option<FileItem>>;

    /// Whether an active item holds `name` in `scope`.
    async fn exists_active_name(&mut self, scope: SiblingScope, name: &str) -> AppResult<bool> {
        Ok(self.find_active_by_name(scope, name).await?.is_some())
    }

    /// Highest delete sequence ever assigned to `original_name` in `scope`.
    async fn max_delete_sequence(
        &mut self,
        scope: SiblingScope,
        original_name: &str,
    ) -> AppResult<Option<i32>>;

    /// Insert or update an item. A second active holder of the same name
    /// in a scope fails with `NameConflict`.
    async fn save_item(&mut self, item: &FileItem) -> AppResult<()>;

    /// Publish all writes of this unit of work.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
