//! # knohub-storage
//!
//! Blob storage backends for KnoHub.

pub mod providers;

pub use providers::LocalStorageBackend;
