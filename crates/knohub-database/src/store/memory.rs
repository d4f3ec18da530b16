//! In-process tree store.
//!
//! A transaction holds the store mutex for its whole lifetime and works on
//! a private copy of the state, which replaces the shared state on commit.
//! Units of work are therefore fully serialized.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use knohub_core::error::AppError;
use knohub_core::result::AppResult;
use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::{FileItem, SiblingScope};
use knohub_entity::resource::{Resource, ResourceType};

use super::{TreeStore, TreeTransaction};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    resources: HashMap<ResourceId, Resource>,
    items: HashMap<FileItemId, FileItem>,
}

/// Tree store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTreeStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every item ever stored, deleted ones included.
    pub async fn all_items(&self) -> Vec<FileItem> {
        let state = self.state.lock().await;
        let mut items: Vec<FileItem> = state.items.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        items
    }

    /// Resource by id regardless of deletion state.
    pub async fn resource(&self, id: ResourceId) -> Option<Resource> {
        self.state.lock().await.resources.get(&id).cloned()
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTreeTransaction { guard, working }))
    }
}

/// A unit of work over [`MemoryTreeStore`].
#[derive(Debug)]
pub struct MemoryTreeTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTreeTransaction {
    fn sorted_resources(&self, mut pred: impl FnMut(&Resource) -> bool) -> Vec<Resource> {
        let mut found: Vec<Resource> = self
            .working
            .resources
            .values()
            .filter(|r| !r.deleted && pred(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        found
    }

    fn active_items(&self, mut pred: impl FnMut(&FileItem) -> bool) -> Vec<FileItem> {
        let mut found: Vec<FileItem> = self
            .working
            .items
            .values()
            .filter(|i| i.is_active() && pred(i))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        found
    }
}

#[async_trait]
impl TreeTransaction for MemoryTreeTransaction {
    async fn find_resource(&mut self, id: ResourceId) -> AppResult<Option<Resource>> {
        Ok(self
            .working
            .resources
            .get(&id)
            .filter(|r| !r.deleted)
            .cloned())
    }

    async fn list_resources(&mut self) -> AppResult<Vec<Resource>> {
        Ok(self.sorted_resources(|_| true))
    }

    async fn list_resources_by_type(
        &mut self,
        resource_type: ResourceType,
    ) -> AppResult<Vec<Resource>> {
        Ok(self.sorted_resources(|r| r.resource_type == resource_type))
    }

    async fn search_resources(&mut self, keyword: &str) -> AppResult<Vec<Resource>> {
        let needle = keyword.to_lowercase();
        Ok(self.sorted_resources(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
        }))
    }

    async fn save_resource(&mut self, resource: &Resource) -> AppResult<()> {
        self.working
            .resources
            .insert(resource.id, resource.clone());
        Ok(())
    }

    async fn find_item(&mut self, id: FileItemId) -> AppResult<Option<FileItem>> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn list_active_in_scope(&mut self, scope: SiblingScope) -> AppResult<Vec<FileItem>> {
        Ok(self.active_items(|i| i.scope() == scope))
    }

    async fn list_active_in_resource(
        &mut self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<FileItem>> {
        Ok(self.active_items(|i| i.resource_id == resource_id))
    }

    async fn find_active_by_name(
        &mut self,
        scope: SiblingScope,
        name: &str,
    ) -> AppResult<Option<FileItem>> {
        Ok(self
            .working
            .items
            .values()
            .find(|i| i.is_active() && i.scope() == scope && i.original_name == name)
            .cloned())
    }

    async fn max_delete_sequence(
        &mut self,
        scope: SiblingScope,
        original_name: &str,
    ) -> AppResult<Option<i32>> {
        Ok(self
            .working
            .items
            .values()
            .filter(|i| i.deleted && i.scope() == scope && i.original_name == original_name)
            .filter_map(|i| i.delete_sequence)
            .max())
    }

    async fn save_item(&mut self, item: &FileItem) -> AppResult<()> {
        let clash = self.working.items.values().any(|other| {
            other.id != item.id
                && other.scope() == item.scope()
                && other.original_name == item.original_name
                && ((item.is_active() && other.is_active())
                    || (item.deleted && other.deleted && other.delete_sequence == item.delete_sequence))
        });
        if clash {
            return Err(if item.is_active() {
                AppError::name_conflict(format!(
                    "An item named '{}' already exists here",
                    item.original_name
                ))
            } else {
                AppError::database(format!(
                    "Delete sequence {:?} already used for '{}'",
                    item.delete_sequence, item.original_name
                ))
            });
        }
        self.working.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTreeTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
