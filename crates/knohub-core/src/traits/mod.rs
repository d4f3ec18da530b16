//! Core traits defined in `knohub-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageBackend;
