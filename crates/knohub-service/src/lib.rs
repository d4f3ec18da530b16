//! # knohub-service
//!
//! Business logic for KnoHub. The [`FileTreeEngine`] owns every mutation of
//! a resource's file tree; the other services build on top of it.
//!
//! Services take their dependencies as `Arc` references at construction.

pub mod metrics;
pub mod preview;
pub mod resource;
pub mod tree;

pub use metrics::VisitorTracker;
pub use preview::{
    CircuitRenderer, CommandCircuitRenderer, CommandDocumentConverter, DocumentConverter,
    PreviewService,
};
pub use resource::ResourceService;
pub use tree::{FileTreeEngine, ScopeLocks, UploadedFile};
