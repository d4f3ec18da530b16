//! The file tree lifecycle engine.
//!
//! Owns upload, folder creation, soft delete, rename, reorder, and listing
//! for every resource. Each mutation locks the sibling scopes it touches,
//! runs in one tree transaction, and commits once.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::traits::storage::{ByteStream, StorageBackend, logical_name};
use knohub_core::types::{FileItemId, ResourceId};
use knohub_database::{TreeStore, TreeTransaction};
use knohub_entity::file_item::{DropPosition, FileItem, FileItemNode, NewFile, SiblingScope};
use knohub_entity::file_item::model::deleted_suffix;
use knohub_entity::resource::Resource;

use super::listing::{self, PreviewUrlFn};
use super::locks::{ScopeGuard, ScopeLocks};
use super::naming;
use super::reorder;

/// Attempts at re-planning the lock set when the tree moved underneath.
const MAX_LOCK_ATTEMPTS: usize = 8;

/// One file received for upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            data: data.into(),
        }
    }
}

/// A blob opened for download.
pub struct Download {
    /// Logical file name without the opaque-id prefix.
    pub file_name: String,
    pub size: Option<u64>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file_name", &self.file_name)
            .field("size", &self.size)
            .finish()
    }
}

/// Maintains the file trees of all resources.
#[derive(Debug)]
pub struct FileTreeEngine {
    store: Arc<dyn TreeStore>,
    storage: Arc<dyn StorageBackend>,
    locks: ScopeLocks,
}

impl FileTreeEngine {
    pub fn new(store: Arc<dyn TreeStore>, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            store,
            storage,
            locks: ScopeLocks::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    // ── Reads ────────────────────────────────────────────────

    /// Active item by id.
    pub async fn get_item(&self, id: FileItemId) -> AppResult<FileItem> {
        let mut tx = self.store.begin().await?;
        active_item(tx.as_mut(), id).await
    }

    /// Nested tree of a resource's active items.
    pub async fn list_tree(
        &self,
        resource_id: ResourceId,
        preview_url: PreviewUrlFn<'_>,
    ) -> AppResult<Vec<FileItemNode>> {
        let mut tx = self.store.begin().await?;
        active_resource(tx.as_mut(), resource_id).await?;
        let items = tx.list_active_in_resource(resource_id).await?;
        drop(tx);

        Ok(listing::assemble(items, preview_url))
    }

    /// Open the blob of an active file of `resource_id` by its stored file name.
    pub async fn open_download(
        &self,
        resource_id: ResourceId,
        storage_file_name: &str,
    ) -> AppResult<Download> {
        let storage_path = format!("{resource_id}/{storage_file_name}");

        let mut tx = self.store.begin().await?;
        active_resource(tx.as_mut(), resource_id).await?;
        let found = tx
            .list_active_in_resource(resource_id)
            .await?
            .into_iter()
            .any(|item| item.storage_path.as_deref() == Some(storage_path.as_str()));
        drop(tx);

        if !found {
            return Err(AppError::not_found("File not found"));
        }

        let size = self.storage.size_of(&storage_path).await.ok();
        let stream = self.storage.read_stream(&storage_path).await?;
        Ok(Download {
            file_name: logical_name(storage_file_name).to_string(),
            size,
            stream,
        })
    }

    // ── Creation ─────────────────────────────────────────────

    /// Store a new file under `parent_id` (or the resource root).
    pub async fn upload(
        &self,
        resource_id: ResourceId,
        parent_id: Option<FileItemId>,
        file: UploadedFile,
    ) -> AppResult<FileItem> {
        let name = naming::upload_name(file.file_name.as_deref());
        let scope = SiblingScope::new(resource_id, parent_id);
        let _guard = self.locks.acquire([scope]).await;

        let mut tx = self.store.begin().await?;
        let display_order = prepare_insert(tx.as_mut(), scope, &name).await?;

        let size_bytes = file.data.len() as u64;
        let storage_path = self.storage.put(resource_id, &name, file.data).await?;

        let item = FileItem::new_file(
            NewFile {
                resource_id,
                parent_id,
                file_type: naming::upload_extension(&name),
                size: naming::format_size(size_bytes),
                size_bytes: size_bytes as i64,
                url: naming::download_url(resource_id, &storage_path),
                storage_path: storage_path.clone(),
                name,
            },
            display_order,
            Utc::now(),
        );

        let saved = async {
            tx.save_item(&item).await?;
            tx.commit().await
        }
        .await;

        if let Err(e) = saved {
            if let Err(cleanup) = self.storage.delete(&storage_path).await {
                warn!(path = %storage_path, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        info!(
            item_id = %item.id,
            resource_id = %resource_id,
            name = %item.name,
            size = size_bytes,
            "File uploaded"
        );
        Ok(item)
    }

    /// Upload several files in order, stopping at the first failure.
    pub async fn upload_batch(
        &self,
        resource_id: ResourceId,
        parent_id: Option<FileItemId>,
        files: Vec<UploadedFile>,
    ) -> AppResult<Vec<FileItem>> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.upload(resource_id, parent_id, file).await?);
        }
        Ok(uploaded)
    }

    /// Create an empty folder under `parent_id` (or the resource root).
    pub async fn create_folder(
        &self,
        resource_id: ResourceId,
        parent_id: Option<FileItemId>,
        name: &str,
    ) -> AppResult<FileItem> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::empty_name("Folder name must not be empty"));
        }
        if naming::has_path_separator(name) {
            return Err(AppError::validation(
                "Folder name must not contain path separators",
            ));
        }

        let scope = SiblingScope::new(resource_id, parent_id);
        let _guard = self.locks.acquire([scope]).await;

        let mut tx = self.store.begin().await?;
        let display_order = prepare_insert(tx.as_mut(), scope, name).await?;

        let folder = FileItem::new_folder(
            resource_id,
            parent_id,
            name.to_string(),
            display_order,
            Utc::now(),
        );
        tx.save_item(&folder).await?;
        tx.commit().await?;

        info!(item_id = %folder.id, resource_id = %resource_id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    // ── Soft delete ──────────────────────────────────────────

    /// Soft-delete a single file.
    pub async fn soft_delete_file(&self, id: FileItemId) -> AppResult<()> {
        let (_guard, mut tx, item) = self
            .lock_item(id, |item| {
                if item.is_folder {
                    Err(AppError::wrong_kind("Expected a file but found a folder"))
                } else {
                    Ok(())
                }
            })
            .await?;

        let now = Utc::now();
        self.soft_delete_one(tx.as_mut(), item.clone(), now).await?;
        compact_scope(tx.as_mut(), item.scope(), now).await?;
        tx.commit().await?;

        info!(item_id = %id, name = %item.original_name, "File deleted");
        Ok(())
    }

    /// Soft-delete a folder and every active descendant.
    pub async fn soft_delete_folder(&self, id: FileItemId) -> AppResult<()> {
        for _ in 0..MAX_LOCK_ATTEMPTS {
            let folder = self.get_item(id).await?;
            if !folder.is_folder {
                return Err(AppError::wrong_kind("Expected a folder but found a file"));
            }

            let mut planned = {
                let mut tx = self.store.begin().await?;
                subtree_scopes(tx.as_mut(), &folder).await?
            };
            planned.insert(folder.scope());

            let guard = self.locks.acquire(planned).await;
            let mut tx = self.store.begin().await?;
            let folder = active_item(tx.as_mut(), id).await?;
            if !folder.is_folder {
                return Err(AppError::wrong_kind("Expected a folder but found a file"));
            }
            let mut needed = subtree_scopes(tx.as_mut(), &folder).await?;
            needed.insert(folder.scope());
            if !needed.iter().all(|scope| guard.covers(scope)) {
                debug!(folder_id = %id, "Folder subtree changed while locking, retrying");
                continue;
            }

            let now = Utc::now();
            let scope = folder.scope();
            let count = self.delete_subtree(tx.as_mut(), folder, now).await?;
            compact_scope(tx.as_mut(), scope, now).await?;
            tx.commit().await?;

            info!(folder_id = %id, items = count, "Folder deleted");
            return Ok(());
        }

        Err(lock_contention(id))
    }

    /// Soft-delete every active item of a resource and the resource itself.
    pub async fn delete_resource(&self, resource_id: ResourceId) -> AppResult<()> {
        for _ in 0..MAX_LOCK_ATTEMPTS {
            let planned = {
                let mut tx = self.store.begin().await?;
                active_resource(tx.as_mut(), resource_id).await?;
                resource_scopes(tx.as_mut(), resource_id).await?
            };

            let guard = self.locks.acquire(planned).await;
            let mut tx = self.store.begin().await?;
            let mut resource = active_resource(tx.as_mut(), resource_id).await?;
            let needed = resource_scopes(tx.as_mut(), resource_id).await?;
            if !needed.iter().all(|scope| guard.covers(scope)) {
                continue;
            }

            let now = Utc::now();
            let mut count = 0;
            for item in tx.list_active_roots(resource_id).await? {
                count += if item.is_folder {
                    self.delete_subtree(tx.as_mut(), item, now).await?
                } else {
                    self.soft_delete_one(tx.as_mut(), item, now).await?;
                    1
                };
            }
            resource.mark_deleted(now);
            tx.save_resource(&resource).await?;
            tx.commit().await?;

            info!(resource_id = %resource_id, items = count, "Resource deleted");
            return Ok(());
        }

        Err(AppError::internal(format!(
            "Resource {resource_id} kept changing while being deleted"
        )))
    }

    /// Delete `root` and its active descendants; returns the number of items.
    ///
    /// A folder's files go first, then its subfolders one by one, then the
    /// folder itself.
    async fn delete_subtree(
        &self,
        tx: &mut dyn TreeTransaction,
        root: FileItem,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let mut count = 0;
        let mut stack = vec![(root, false)];

        while let Some((folder, expanded)) = stack.pop() {
            if expanded {
                self.soft_delete_one(tx, folder, now).await?;
                count += 1;
                continue;
            }

            let children = tx.list_active_children(&folder).await?;
            stack.push((folder, true));

            let (subfolders, files): (Vec<_>, Vec<_>) =
                children.into_iter().partition(|child| child.is_folder);
            for file in files {
                self.soft_delete_one(tx, file, now).await?;
                count += 1;
            }
            stack.extend(subfolders.into_iter().rev().map(|sub| (sub, false)));
        }

        Ok(count)
    }

    /// Mark one item deleted with the next free sequence number.
    ///
    /// A failing blob move is logged and the metadata change still goes
    /// through.
    async fn soft_delete_one(
        &self,
        tx: &mut dyn TreeTransaction,
        mut item: FileItem,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let sequence = tx
            .max_delete_sequence(item.scope(), &item.original_name)
            .await?
            .unwrap_or(0)
            + 1;

        if let Some(path) = item.storage_path.clone() {
            match self
                .storage
                .move_with_suffix(&path, &deleted_suffix(sequence))
                .await
            {
                Ok(moved) => item.storage_path = Some(moved),
                Err(e) => {
                    warn!(item_id = %item.id, path = %path, error = %e, "Failed to move deleted blob");
                }
            }
        }

        item.mark_deleted(sequence, now);
        tx.save_item(&item).await
    }

    // ── Rename ───────────────────────────────────────────────

    /// Rename a file or folder. File extensions survive the rename.
    pub async fn rename(&self, id: FileItemId, new_name: &str) -> AppResult<FileItem> {
        let candidate = new_name.trim();
        if candidate.is_empty() {
            return Err(AppError::empty_name("Name must not be empty"));
        }
        if naming::has_path_separator(candidate) {
            return Err(AppError::validation("Name must not contain path separators"));
        }

        let (_guard, mut tx, mut item) = self.lock_item(id, |_| Ok(())).await?;

        let final_name = if item.is_folder {
            candidate.to_string()
        } else {
            naming::pin_extension(candidate, current_extension(&item).as_deref())
        };

        if final_name == item.original_name {
            return Ok(item);
        }
        if tx.exists_active_name(item.scope(), &final_name).await? {
            return Err(AppError::name_conflict(format!(
                "An item named '{final_name}' already exists here"
            )));
        }

        let now = Utc::now();
        let previous_path = item.storage_path.clone();
        let mut moved_path = None;

        if let Some(path) = previous_path.as_deref() {
            match self.storage.rename(path, &final_name).await {
                Ok(new_path) => {
                    item.url = Some(naming::download_url(item.resource_id, &new_path));
                    item.storage_path = Some(new_path.clone());
                    moved_path = Some(new_path);
                }
                Err(e) if e.is_not_found() => {
                    warn!(item_id = %id, path = %path, "Blob missing, renaming metadata only");
                }
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::IoFailure,
                        format!("Failed to rename blob for '{}'", item.name),
                        e,
                    ));
                }
            }
        }

        if !item.is_folder {
            if let Some(ext) = naming::renamed_extension(&final_name) {
                item.file_type = Some(ext);
            }
            if let Some(path) = item.storage_path.as_deref() {
                match self.storage.size_of(path).await {
                    Ok(bytes) => {
                        item.size = Some(naming::format_size(bytes));
                        item.size_bytes = Some(bytes as i64);
                    }
                    Err(e) => warn!(item_id = %id, error = %e, "Failed to refresh file size"),
                }
            }
        }

        let old_name = item.original_name.clone();
        item.set_name(final_name, now);

        let saved = async {
            tx.save_item(&item).await?;
            tx.commit().await
        }
        .await;

        if let Err(e) = saved {
            if let Some(new_path) = moved_path {
                if let Err(undo) = self.storage.rename(&new_path, &old_name).await {
                    warn!(item_id = %id, error = %undo, "Failed to restore blob name");
                }
            }
            return Err(e);
        }

        info!(item_id = %id, from = %old_name, to = %item.name, "Item renamed");
        Ok(item)
    }

    // ── Reorder ──────────────────────────────────────────────

    /// Move `drag_id` before, after, or inside `drop_id` and renumber.
    pub async fn reorder(
        &self,
        drag_id: FileItemId,
        drop_id: FileItemId,
        position: DropPosition,
    ) -> AppResult<()> {
        if drag_id == drop_id {
            return Ok(());
        }

        for _ in 0..MAX_LOCK_ATTEMPTS {
            let (old_scope, new_scope) = {
                let mut tx = self.store.begin().await?;
                let plan = plan_move(tx.as_mut(), drag_id, drop_id, position).await?;
                (plan.drag.scope(), plan.target)
            };

            let guard = self.locks.acquire([old_scope, new_scope]).await;
            let mut tx = self.store.begin().await?;
            let plan = plan_move(tx.as_mut(), drag_id, drop_id, position).await?;
            if !guard.covers(&plan.drag.scope()) || !guard.covers(&plan.target) {
                continue;
            }

            self.apply_move(tx.as_mut(), plan, drop_id, position).await?;
            tx.commit().await?;

            info!(drag_id = %drag_id, drop_id = %drop_id, position = %position, "Items reordered");
            return Ok(());
        }

        Err(lock_contention(drag_id))
    }

    async fn apply_move(
        &self,
        tx: &mut dyn TreeTransaction,
        plan: MovePlan,
        drop_id: FileItemId,
        position: DropPosition,
    ) -> AppResult<()> {
        let MovePlan { mut drag, target } = plan;
        let old_scope = drag.scope();
        let crosses_scope = old_scope != target;

        if crosses_scope {
            if drag.is_folder {
                ensure_not_descendant(tx, &drag, target.parent_id).await?;
            }
            if tx.exists_active_name(target, &drag.original_name).await? {
                return Err(AppError::name_conflict(format!(
                    "An item named '{}' already exists in the target folder",
                    drag.original_name
                )));
            }
        }

        let now = Utc::now();
        let mut siblings: HashMap<FileItemId, FileItem> = tx
            .list_active_in_scope(target)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let current: Vec<FileItemId> = {
            let mut ordered: Vec<&FileItem> = siblings.values().collect();
            ordered.sort_by(|a, b| {
                a.display_order
                    .cmp(&b.display_order)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            });
            ordered.into_iter().map(|item| item.id).collect()
        };
        let order = reorder::place(current, drag.id, drop_id, position);

        let drag_id = drag.id;
        drag.parent_id = target.parent_id;
        siblings.insert(drag_id, drag);

        for (index, id) in order.iter().enumerate() {
            let Some(item) = siblings.get_mut(id) else {
                continue;
            };
            let index = index as i32;
            if item.display_order != index || item.id == drag_id {
                item.display_order = index;
                item.updated_at = now;
                tx.save_item(item).await?;
            }
        }

        if crosses_scope {
            compact_scope(tx, old_scope, now).await?;
        }
        Ok(())
    }

    // ── Locking helpers ──────────────────────────────────────

    /// Lock the scope of an active item and return it inside an open
    /// transaction, re-planning if the item moved while waiting.
    async fn lock_item(
        &self,
        id: FileItemId,
        check: impl Fn(&FileItem) -> AppResult<()>,
    ) -> AppResult<(ScopeGuard, Box<dyn TreeTransaction>, FileItem)> {
        for _ in 0..MAX_LOCK_ATTEMPTS {
            let item = self.get_item(id).await?;
            check(&item)?;

            let guard = self.locks.acquire([item.scope()]).await;
            let mut tx = self.store.begin().await?;
            let item = active_item(tx.as_mut(), id).await?;
            check(&item)?;
            if guard.covers(&item.scope()) {
                return Ok((guard, tx, item));
            }
        }

        Err(lock_contention(id))
    }
}

/// Where a drag item should go.
struct MovePlan {
    drag: FileItem,
    target: SiblingScope,
}

async fn plan_move(
    tx: &mut dyn TreeTransaction,
    drag_id: FileItemId,
    drop_id: FileItemId,
    position: DropPosition,
) -> AppResult<MovePlan> {
    let drag = active_item(tx, drag_id).await?;
    let drop = active_item(tx, drop_id).await?;

    if drag.resource_id != drop.resource_id {
        return Err(AppError::invalid_target(
            "Items belong to different resources",
        ));
    }

    let target = match position {
        DropPosition::Inside => {
            if !drop.is_folder {
                return Err(AppError::invalid_target("Drop target is not a folder"));
            }
            SiblingScope::new(drop.resource_id, Some(drop.id))
        }
        DropPosition::Before | DropPosition::After => drop.scope(),
    };

    Ok(MovePlan { drag, target })
}

/// Reject moving `folder` under itself or one of its descendants.
async fn ensure_not_descendant(
    tx: &mut dyn TreeTransaction,
    folder: &FileItem,
    new_parent: Option<FileItemId>,
) -> AppResult<()> {
    let mut cursor = new_parent;
    while let Some(id) = cursor {
        if id == folder.id {
            return Err(AppError::invalid_target(
                "A folder cannot be moved into itself or its descendants",
            ));
        }
        cursor = match tx.find_item(id).await? {
            Some(ancestor) => ancestor.parent_id,
            None => None,
        };
    }
    Ok(())
}

async fn active_item(tx: &mut dyn TreeTransaction, id: FileItemId) -> AppResult<FileItem> {
    tx.find_active_item(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File item {id} not found")))
}

async fn active_resource(tx: &mut dyn TreeTransaction, id: ResourceId) -> AppResult<Resource> {
    tx.find_resource(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Resource {id} not found")))
}

/// Validate the target of a new item and return its display order.
async fn prepare_insert(
    tx: &mut dyn TreeTransaction,
    scope: SiblingScope,
    name: &str,
) -> AppResult<i32> {
    active_resource(tx, scope.resource_id).await?;

    if let Some(parent_id) = scope.parent_id {
        let parent = tx
            .find_active_item(parent_id)
            .await?
            .ok_or_else(|| AppError::invalid_target(format!("Folder {parent_id} not found")))?;
        if !parent.is_folder {
            return Err(AppError::invalid_target("Target is not a folder"));
        }
        if parent.resource_id != scope.resource_id {
            return Err(AppError::invalid_target(
                "Folder belongs to a different resource",
            ));
        }
    }

    if tx.exists_active_name(scope, name).await? {
        return Err(AppError::name_conflict(format!(
            "An item named '{name}' already exists here"
        )));
    }

    Ok(tx.list_active_in_scope(scope).await?.len() as i32)
}

/// Renumber the active items of `scope` to `0..n`.
async fn compact_scope(
    tx: &mut dyn TreeTransaction,
    scope: SiblingScope,
    now: DateTime<Utc>,
) -> AppResult<()> {
    for (index, mut item) in tx.list_active_in_scope(scope).await?.into_iter().enumerate() {
        let index = index as i32;
        if item.display_order != index {
            item.display_order = index;
            item.updated_at = now;
            tx.save_item(&item).await?;
        }
    }
    Ok(())
}

/// Scopes inside `folder`: its own child scope and those of every active
/// descendant folder.
async fn subtree_scopes(
    tx: &mut dyn TreeTransaction,
    folder: &FileItem,
) -> AppResult<BTreeSet<SiblingScope>> {
    let mut scopes = BTreeSet::new();
    let mut pending = vec![folder.clone()];

    while let Some(current) = pending.pop() {
        scopes.insert(SiblingScope::new(current.resource_id, Some(current.id)));
        pending.extend(
            tx.list_active_children(&current)
                .await?
                .into_iter()
                .filter(|child| child.is_folder),
        );
    }

    Ok(scopes)
}

/// Root scope plus every active folder's child scope of a resource.
async fn resource_scopes(
    tx: &mut dyn TreeTransaction,
    resource_id: ResourceId,
) -> AppResult<BTreeSet<SiblingScope>> {
    let mut scopes: BTreeSet<SiblingScope> = tx
        .list_active_in_resource(resource_id)
        .await?
        .into_iter()
        .filter(|item| item.is_folder)
        .map(|folder| SiblingScope::new(resource_id, Some(folder.id)))
        .collect();
    scopes.insert(SiblingScope::root(resource_id));
    Ok(scopes)
}

/// Extension used for pinning: the stored type, else the current name's.
fn current_extension(item: &FileItem) -> Option<String> {
    item.file_type
        .clone()
        .filter(|ext| !ext.is_empty())
        .or_else(|| naming::upload_extension(&item.original_name))
}

fn lock_contention(id: FileItemId) -> AppError {
    AppError::internal(format!("Item {id} kept moving while being locked"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use knohub_database::MemoryTreeStore;
    use knohub_entity::resource::{NewResource, ResourceType};
    use knohub_storage::LocalStorageBackend;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: MemoryTreeStore,
        storage: Arc<LocalStorageBackend>,
        engine: FileTreeEngine,
        resource_id: ResourceId,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryTreeStore::new();
        let resource = Resource::new(
            NewResource {
                resource_type: ResourceType::Course,
                title: "Operating Systems".to_string(),
                description: String::new(),
                tag: None,
                update_date: None,
            },
            Utc::now(),
        );
        let mut tx = store.begin().await.unwrap();
        tx.save_resource(&resource).await.unwrap();
        tx.commit().await.unwrap();

        let storage = Arc::new(LocalStorageBackend::new(dir.path()).await.unwrap());
        let engine = FileTreeEngine::new(
            Arc::new(store.clone()),
            Arc::clone(&storage) as Arc<dyn StorageBackend>,
        );
        Fixture {
            _dir: dir,
            store,
            storage,
            engine,
            resource_id: resource.id,
        }
    }

    async fn names_in(fx: &Fixture, parent: Option<FileItemId>) -> Vec<(String, i32)> {
        let mut tx = fx.store.begin().await.unwrap();
        tx.list_active_in_scope(SiblingScope::new(fx.resource_id, parent))
            .await
            .unwrap()
            .into_iter()
            .map(|item| (item.name, item.display_order))
            .collect()
    }

    #[tokio::test]
    async fn test_upload_sets_metadata() {
        let fx = fixture().await;
        let item = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("Report.PDF", vec![0u8; 2048]))
            .await
            .unwrap();

        assert_eq!(item.name, "Report.PDF");
        assert_eq!(item.file_type.as_deref(), Some("pdf"));
        assert_eq!(item.size.as_deref(), Some("2.0KB"));
        assert_eq!(item.display_order, 0);
        let path = item.storage_path.clone().unwrap();
        assert!(fx.storage.exists(&path).await.unwrap());
        assert_eq!(
            item.url.as_deref(),
            Some(naming::download_url(fx.resource_id, &path).as_str())
        );
    }

    #[tokio::test]
    async fn test_upload_without_name() {
        let fx = fixture().await;
        let item = fx
            .engine
            .upload(
                fx.resource_id,
                None,
                UploadedFile {
                    file_name: None,
                    data: Bytes::from_static(b"x"),
                },
            )
            .await
            .unwrap();
        assert_eq!(item.name, naming::UNNAMED_FILE);
        assert_eq!(item.file_type, None);
    }

    #[tokio::test]
    async fn test_upload_into_file_is_invalid_target() {
        let fx = fixture().await;
        let file = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "a"))
            .await
            .unwrap();
        let err = fx
            .engine
            .upload(fx.resource_id, Some(file.id), UploadedFile::new("b.txt", "b"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTarget);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .engine
            .create_folder(ResourceId::new(), None, "docs")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts_and_leaves_no_blob() {
        let fx = fixture().await;
        fx.engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "one"))
            .await
            .unwrap();
        let err = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "two"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameConflict);

        let dir = fx.storage.root().join(fx.resource_id.to_string());
        assert_eq!(std::fs::read_dir(dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_delete_sequence_increments() {
        let fx = fixture().await;
        for expected in 1..=2 {
            let item = fx
                .engine
                .upload(fx.resource_id, None, UploadedFile::new("a.txt", "x"))
                .await
                .unwrap();
            fx.engine.soft_delete_file(item.id).await.unwrap();

            let mut tx = fx.store.begin().await.unwrap();
            let deleted = tx.find_item(item.id).await.unwrap().unwrap();
            assert_eq!(deleted.delete_sequence, Some(expected));
            assert_eq!(deleted.name, format!("a.txt_deleted_{expected}"));
            assert_eq!(deleted.original_name, "a.txt");
            assert!(
                deleted
                    .storage_path
                    .as_deref()
                    .unwrap()
                    .ends_with(&format!("_deleted_{expected}"))
            );
        }
    }

    #[tokio::test]
    async fn test_soft_delete_kind_checks() {
        let fx = fixture().await;
        let folder = fx
            .engine
            .create_folder(fx.resource_id, None, "docs")
            .await
            .unwrap();
        let file = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "x"))
            .await
            .unwrap();

        assert_eq!(
            fx.engine.soft_delete_file(folder.id).await.unwrap_err().kind,
            ErrorKind::WrongKind
        );
        assert_eq!(
            fx.engine.soft_delete_folder(file.id).await.unwrap_err().kind,
            ErrorKind::WrongKind
        );
    }

    #[tokio::test]
    async fn test_soft_delete_compacts_scope() {
        let fx = fixture().await;
        let mut ids = Vec::new();
        for name in ["a.txt", "b.txt", "c.txt"] {
            let item = fx
                .engine
                .upload(fx.resource_id, None, UploadedFile::new(name, "x"))
                .await
                .unwrap();
            ids.push(item.id);
        }

        fx.engine.soft_delete_file(ids[0]).await.unwrap();
        assert_eq!(
            names_in(&fx, None).await,
            vec![("b.txt".to_string(), 0), ("c.txt".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_rename_pins_extension_and_moves_blob() {
        let fx = fixture().await;
        let item = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("draft.pdf", "pdf-bytes"))
            .await
            .unwrap();
        let old_path = item.storage_path.clone().unwrap();

        let renamed = fx.engine.rename(item.id, " report.txt ").await.unwrap();
        assert_eq!(renamed.name, "report.pdf");
        assert_eq!(renamed.original_name, "report.pdf");
        assert_eq!(renamed.file_type.as_deref(), Some("pdf"));

        let new_path = renamed.storage_path.clone().unwrap();
        assert!(new_path.ends_with("_report.pdf"));
        assert!(!fx.storage.exists(&old_path).await.unwrap());
        assert!(fx.storage.exists(&new_path).await.unwrap());
        assert!(renamed.url.as_deref().unwrap().ends_with("_report.pdf"));
    }

    #[tokio::test]
    async fn test_rename_rules() {
        let fx = fixture().await;
        let a = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "x"))
            .await
            .unwrap();
        fx.engine
            .upload(fx.resource_id, None, UploadedFile::new("b.txt", "x"))
            .await
            .unwrap();

        assert_eq!(
            fx.engine.rename(a.id, "   ").await.unwrap_err().kind,
            ErrorKind::EmptyName
        );
        assert_eq!(
            fx.engine.rename(a.id, "b").await.unwrap_err().kind,
            ErrorKind::NameConflict
        );
        assert_eq!(fx.engine.rename(a.id, "a.txt").await.unwrap().name, "a.txt");
    }

    #[tokio::test]
    async fn test_names_with_path_separators_rejected() {
        let fx = fixture().await;
        let a = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "x"))
            .await
            .unwrap();

        for bad in ["x/y.txt", "x\\y.txt"] {
            assert_eq!(
                fx.engine.rename(a.id, bad).await.unwrap_err().kind,
                ErrorKind::Validation
            );
            assert_eq!(
                fx.engine
                    .create_folder(fx.resource_id, None, bad)
                    .await
                    .unwrap_err()
                    .kind,
                ErrorKind::Validation
            );
        }

        assert_eq!(names_in(&fx, None).await, vec![("a.txt".to_string(), 0)]);
        assert!(fx.storage.exists(a.storage_path.as_deref().unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_with_missing_blob_updates_metadata() {
        let fx = fixture().await;
        let item = fx
            .engine
            .upload(fx.resource_id, None, UploadedFile::new("a.txt", "x"))
            .await
            .unwrap();
        fx.storage
            .delete(item.storage_path.as_deref().unwrap())
            .await
            .unwrap();

        let renamed = fx.engine.rename(item.id, "b.txt").await.unwrap();
        assert_eq!(renamed.name, "b.txt");
        assert_eq!(renamed.storage_path, item.storage_path);
    }

    #[tokio::test]
    async fn test_reorder_within_scope() {
        let fx = fixture().await;
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(
                fx.engine
                    .create_folder(fx.resource_id, None, name)
                    .await
                    .unwrap()
                    .id,
            );
        }

        fx.engine
            .reorder(ids[2], ids[0], DropPosition::Before)
            .await
            .unwrap();
        assert_eq!(
            names_in(&fx, None).await,
            vec![
                ("c".to_string(), 0),
                ("a".to_string(), 1),
                ("b".to_string(), 2)
            ]
        );

        fx.engine.reorder(ids[1], ids[1], DropPosition::After).await.unwrap();
    }

    #[tokio::test]
    async fn test_reorder_into_own_descendant_rejected() {
        let fx = fixture().await;
        let outer = fx
            .engine
            .create_folder(fx.resource_id, None, "outer")
            .await
            .unwrap();
        let inner = fx
            .engine
            .create_folder(fx.resource_id, Some(outer.id), "inner")
            .await
            .unwrap();

        let err = fx
            .engine
            .reorder(outer.id, inner.id, DropPosition::Inside)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTarget);
    }
}
