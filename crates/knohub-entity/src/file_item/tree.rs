//! Nested tree view of a resource's items.

use serde::{Deserialize, Serialize};

use knohub_core::types::FileItemId;

use super::model::FileItem;

/// A node in the externally visible file tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItemNode {
    pub id: FileItemId,
    pub name: String,
    pub is_folder: bool,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub size: Option<String>,
    pub url: Option<String>,
    /// Present for files that have a rendered preview image.
    pub preview_url: Option<String>,
    /// Children ordered by display order; empty for files.
    pub children: Vec<FileItemNode>,
}

impl FileItemNode {
    /// Build a leaf node from an item; children are attached by the caller.
    pub fn from_item(item: &FileItem, preview_url: Option<String>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            is_folder: item.is_folder,
            file_type: item.file_type.clone(),
            size: item.size.clone(),
            url: item.url.clone(),
            preview_url,
            children: Vec::new(),
        }
    }
}
