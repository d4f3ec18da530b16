//! Storage backend implementations.

pub mod local;

pub use local::LocalStorageBackend;
