//! Sibling list placement for drag-and-drop.

use knohub_core::types::FileItemId;
use knohub_entity::file_item::DropPosition;

/// Place `drag` relative to `drop` within `siblings`.
///
/// `drag` is removed first if present. `Inside` appends it; `Before` and
/// `After` insert it next to `drop`, or append when `drop` is not in the
/// list. The returned order is the new display order.
pub fn place(
    mut siblings: Vec<FileItemId>,
    drag: FileItemId,
    drop: FileItemId,
    position: DropPosition,
) -> Vec<FileItemId> {
    siblings.retain(|id| *id != drag);

    let index = match position {
        DropPosition::Inside => None,
        DropPosition::Before => siblings.iter().position(|id| *id == drop),
        DropPosition::After => siblings.iter().position(|id| *id == drop).map(|i| i + 1),
    };

    match index {
        Some(i) => siblings.insert(i, drag),
        None => siblings.push(drag),
    }
    siblings
}
