//! Local filesystem storage backend.
//!
//! Layout: `<root>/<resource-id>/<opaque-id>_<logical-name>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::traits::storage::{ByteStream, StorageBackend, blob_file_name, blob_prefix};
use knohub_core::types::ResourceId;

/// Stores blobs as plain files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    root: PathBuf,
}

impl LocalStorageBackend {
    /// Create a backend rooted at `root_path`, creating the directory.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::IoFailure,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an opaque path below the root, refusing anything that escapes it.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid storage path: {path}")));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::IoFailure,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Move a blob to a sibling file name inside the same directory.
    async fn move_within_dir(&self, path: &str, new_file_name: &str) -> AppResult<String> {
        let new_path = match path.rfind('/') {
            Some(idx) => format!("{}/{}", &path[..idx], new_file_name),
            None => new_file_name.to_string(),
        };
        if new_path == path {
            return Ok(new_path);
        }

        let from = self.resolve(path)?;
        let to = self.resolve(&new_path)?;
        fs::rename(&from, &to)
            .await
            .map_err(|e| io_error(e, format!("Failed to move {path} -> {new_path}")))?;

        debug!(from = path, to = %new_path, "Moved blob");
        Ok(new_path)
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    fn backend_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn put(
        &self,
        resource_id: ResourceId,
        logical_name: &str,
        data: Bytes,
    ) -> AppResult<String> {
        let logical = sanitize_file_name(logical_name);
        let path = format!("{resource_id}/{}_{logical}", Uuid::new_v4());
        let full_path = self.resolve(&path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data)
            .await
            .map_err(|e| io_error(e, format!("Failed to write blob: {path}")))?;

        debug!(path = %path, bytes = data.len(), "Wrote blob");
        Ok(path)
    }

    async fn move_with_suffix(&self, path: &str, suffix: &str) -> AppResult<String> {
        let file_name = format!("{}{}", blob_file_name(path), sanitize_file_name(suffix));
        self.move_within_dir(path, &file_name).await
    }

    async fn rename(&self, path: &str, new_logical_name: &str) -> AppResult<String> {
        let current = blob_file_name(path);
        let prefix = blob_prefix(current)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let file_name = format!("{prefix}_{}", sanitize_file_name(new_logical_name));
        self.move_within_dir(path, &file_name).await
    }

    async fn size_of(&self, path: &str) -> AppResult<u64> {
        let full_path = self.resolve(path)?;
        let meta = fs::metadata(&full_path)
            .await
            .map_err(|e| io_error(e, format!("Failed to stat blob: {path}")))?;
        Ok(meta.len())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| io_error(e, format!("Failed to read blob: {path}")))?;
        Ok(Bytes::from(data))
    }

    async fn read_stream(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| io_error(e, format!("Failed to open blob: {path}")))?;
        Ok(Box::pin(ReaderStream::new(file).map(|chunk| chunk.map(Bytes::from))))
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        fs::try_exists(&full_path)
            .await
            .map_err(|e| io_error(e, format!("Failed to stat blob: {path}")))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e, format!("Failed to delete blob: {path}"))),
        }
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).ok()
    }
}

/// Map an I/O error, keeping `NotFound` distinguishable.
fn io_error(err: std::io::Error, message: String) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::with_source(ErrorKind::NotFound, message, err)
    } else {
        AppError::with_source(ErrorKind::IoFailure, message, err)
    }
}

/// Keep only the final segment of a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match last {
        "" | "." | ".." => "unnamed_file".to_string(),
        other => other.to_string(),
    }
}
