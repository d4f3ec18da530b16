//! Blob storage contract used by the file tree engine.
//!
//! A blob is addressed by an opaque path of the form
//! `<resource-id>/<opaque-id>_<logical-name>`. None of these operations are
//! transactional with the tree store.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;
use crate::types::ResourceId;

/// A byte stream used for reading blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for physical blob backends.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type name (e.g. `"local"`).
    fn backend_type(&self) -> &str;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Persist `data` under a fresh opaque id and return the opaque path.
    async fn put(&self, resource_id: ResourceId, logical_name: &str, data: Bytes)
    -> AppResult<String>;

    /// Append `suffix` to the blob's file name and return the new path.
    async fn move_with_suffix(&self, path: &str, suffix: &str) -> AppResult<String>;

    /// Give the blob a new logical name, keeping its opaque-id prefix.
    async fn rename(&self, path: &str, new_logical_name: &str) -> AppResult<String>;

    /// Size of the blob in bytes; `NotFound` when it does not exist.
    async fn size_of(&self, path: &str) -> AppResult<u64>;

    /// Read the whole blob into memory.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Open the blob as a byte stream.
    async fn read_stream(&self, path: &str) -> AppResult<ByteStream>;

    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Remove the blob; missing blobs are not an error.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Filesystem location of the blob, for backends that have one.
    fn local_path(&self, path: &str) -> Option<PathBuf>;
}

/// Final path segment of an opaque blob path.
pub fn blob_file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Opaque-id prefix of a blob file name, if it carries one.
pub fn blob_prefix(file_name: &str) -> Option<&str> {
    match file_name.find('_') {
        Some(idx) if idx > 0 => Some(&file_name[..idx]),
        _ => None,
    }
}

/// Logical (user-facing) name of a blob file name with its prefix removed.
pub fn logical_name(file_name: &str) -> &str {
    match blob_prefix(file_name) {
        Some(prefix) => &file_name[prefix.len() + 1..],
        None => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_name_helpers() {
        let path = "5b0e/9f2c-11_notes_v2.txt";
        assert_eq!(blob_file_name(path), "9f2c-11_notes_v2.txt");
        assert_eq!(blob_prefix("9f2c-11_notes_v2.txt"), Some("9f2c-11"));
        assert_eq!(logical_name("9f2c-11_notes_v2.txt"), "notes_v2.txt");
        assert_eq!(logical_name("plain.txt"), "plain.txt");
        assert_eq!(blob_prefix("_leading.txt"), None);
    }
}
