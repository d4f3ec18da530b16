//! PostgreSQL queries, one repository per table.
//!
//! Repositories take a connection rather than owning the pool so every
//! query can run inside the caller's transaction.

pub mod file_item;
pub mod resource;

pub use file_item::FileItemRepository;
pub use resource::ResourceRepository;
