//! Assembly of the nested tree view from a flat item list.

use std::collections::HashMap;

use knohub_core::types::FileItemId;
use knohub_entity::file_item::{FileItem, FileItemNode};

/// Computes the preview locator of a file, if it has one.
pub type PreviewUrlFn<'a> = &'a (dyn Fn(&FileItem) -> Option<String> + Send + Sync);

/// Build the nested tree of active items.
///
/// Each level is ordered by display order, then creation time. Items whose
/// parent is not part of `items` are unreachable and left out.
pub fn assemble(items: Vec<FileItem>, preview_url: PreviewUrlFn<'_>) -> Vec<FileItemNode> {
    let mut by_parent: HashMap<Option<FileItemId>, Vec<FileItem>> = HashMap::new();
    for item in items.into_iter().filter(FileItem::is_active) {
        by_parent.entry(item.parent_id).or_default().push(item);
    }
    for level in by_parent.values_mut() {
        level.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
    }

    build_level(&mut by_parent, None, preview_url)
}

fn build_level(
    by_parent: &mut HashMap<Option<FileItemId>, Vec<FileItem>>,
    parent: Option<FileItemId>,
    preview_url: PreviewUrlFn<'_>,
) -> Vec<FileItemNode> {
    let Some(level) = by_parent.remove(&parent) else {
        return Vec::new();
    };

    level
        .into_iter()
        .map(|item| {
            let mut node = FileItemNode::from_item(&item, preview_url(&item));
            if item.is_folder {
                node.children = build_level(by_parent, Some(item.id), preview_url);
            }
            node
        })
        .collect()
}
