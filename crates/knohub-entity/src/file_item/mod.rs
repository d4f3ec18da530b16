//! File and folder node entities.

pub mod model;
pub mod position;
pub mod scope;
pub mod tree;

pub use model::{FileItem, NewFile};
pub use position::DropPosition;
pub use scope::SiblingScope;
pub use tree::FileItemNode;
