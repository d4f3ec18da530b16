//! File tree lifecycle engine.

pub mod engine;
pub mod listing;
pub mod locks;
pub mod naming;
pub mod reorder;

pub use engine::{FileTreeEngine, UploadedFile};
pub use locks::{ScopeGuard, ScopeLocks};
