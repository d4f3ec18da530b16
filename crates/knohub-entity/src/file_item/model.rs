//! File item entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use knohub_core::types::{FileItemId, ResourceId};

use super::scope::SiblingScope;

/// A node in a resource's file tree: either a file or a folder.
///
/// Folders never carry `file_type`, `size`, `size_bytes`, `url` or
/// `storage_path`. A non-deleted item never carries a `delete_sequence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: FileItemId,
    /// Owning resource; immutable after creation.
    pub resource_id: ResourceId,
    /// Parent folder, `None` at the resource root.
    pub parent_id: Option<FileItemId>,
    /// Current display name.
    pub name: String,
    /// Name used for collision scoping and delete-sequence lookup.
    pub original_name: String,
    pub is_folder: bool,
    /// Lowercase extension (files only).
    pub file_type: Option<String>,
    /// Human-readable size (files only).
    pub size: Option<String>,
    pub size_bytes: Option<i64>,
    /// Download locator (files only).
    pub url: Option<String>,
    /// Opaque storage backend path (files only).
    pub storage_path: Option<String>,
    pub deleted: bool,
    pub delete_sequence: Option<i32>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Rank among active siblings, contiguous from 0.
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File-only attributes of a freshly uploaded blob.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub resource_id: ResourceId,
    pub parent_id: Option<FileItemId>,
    pub name: String,
    pub file_type: Option<String>,
    pub size: String,
    pub size_bytes: i64,
    pub url: String,
    pub storage_path: String,
}

impl FileItem {
    /// Build an active file node.
    pub fn new_file(data: NewFile, display_order: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: FileItemId::new(),
            resource_id: data.resource_id,
            parent_id: data.parent_id,
            original_name: data.name.clone(),
            name: data.name,
            is_folder: false,
            file_type: data.file_type,
            size: Some(data.size),
            size_bytes: Some(data.size_bytes),
            url: Some(data.url),
            storage_path: Some(data.storage_path),
            deleted: false,
            delete_sequence: None,
            deleted_at: None,
            display_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an active folder node.
    pub fn new_folder(
        resource_id: ResourceId,
        parent_id: Option<FileItemId>,
        name: String,
        display_order: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FileItemId::new(),
            resource_id,
            parent_id,
            original_name: name.clone(),
            name,
            is_folder: true,
            file_type: None,
            size: None,
            size_bytes: None,
            url: None,
            storage_path: None,
            deleted: false,
            delete_sequence: None,
            deleted_at: None,
            display_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// The sibling group this item belongs to.
    pub fn scope(&self) -> SiblingScope {
        SiblingScope::new(self.resource_id, self.parent_id)
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Mark the item soft-deleted with the given sequence number.
    ///
    /// The display name becomes `<original_name>_deleted_<sequence>`; the
    /// original name is kept for future sequence lookups.
    pub fn mark_deleted(&mut self, sequence: i32, at: DateTime<Utc>) {
        self.name = format!("{}{}", self.original_name, deleted_suffix(sequence));
        self.deleted = true;
        self.delete_sequence = Some(sequence);
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    /// Set both the display and original name.
    pub fn set_name(&mut self, name: String, at: DateTime<Utc>) {
        self.original_name = name.clone();
        self.name = name;
        self.updated_at = at;
    }
}

/// Suffix appended to names and blobs of soft-deleted items.
pub fn deleted_suffix(sequence: i32) -> String {
    format!("_deleted_{sequence}")
}
