//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use knohub_api::{AppState, build_app};
use knohub_core::config::AppConfig;
use knohub_core::error::AppError;
use knohub_core::result::AppResult;
use knohub_core::traits::StorageBackend;
use knohub_core::traits::storage::ByteStream;
use knohub_core::types::ResourceId;
use knohub_database::{MemoryTreeStore, TreeStore};
use knohub_entity::resource::{NewResource, Resource, ResourceType};
use knohub_service::FileTreeEngine;
use knohub_storage::LocalStorageBackend;

const BOUNDARY: &str = "knohub-test-boundary";

/// Engine wired to an in-memory store and a temp-dir storage backend.
pub struct Harness {
    pub engine: Arc<FileTreeEngine>,
    pub store: MemoryTreeStore,
    pub resource_id: ResourceId,
    pub upload_dir: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(|local| Arc::new(local) as Arc<dyn StorageBackend>).await
    }

    /// Harness whose storage refuses to rename blobs into their deleted form.
    pub async fn with_failing_moves() -> Self {
        Self::build(|local| Arc::new(FailingStorage::moves(local)) as Arc<dyn StorageBackend>)
            .await
    }

    /// Harness whose storage refuses every write.
    pub async fn with_failing_puts() -> Self {
        Self::build(|local| Arc::new(FailingStorage::puts(local)) as Arc<dyn StorageBackend>)
            .await
    }

    /// Harness whose storage refuses to rename blobs after a metadata rename.
    pub async fn with_failing_renames() -> Self {
        Self::build(|local| Arc::new(FailingStorage::renames(local)) as Arc<dyn StorageBackend>)
            .await
    }

    async fn build(wrap: impl FnOnce(LocalStorageBackend) -> Arc<dyn StorageBackend>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorageBackend::new(dir.path()).await.unwrap();
        let store = MemoryTreeStore::new();
        let resource_id = seed_resource(&store, "Digital Logic").await;
        let engine = Arc::new(FileTreeEngine::new(
            Arc::new(store.clone()),
            wrap(local),
        ));

        Self {
            engine,
            store,
            resource_id,
            upload_dir: dir.path().to_path_buf(),
            _dir: dir,
        }
    }

    /// Stored blob file names under this harness's resource directory.
    pub fn blob_names(&self) -> Vec<String> {
        let dir = self.upload_dir.join(self.resource_id.to_string());
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Insert an active resource directly through the store.
pub async fn seed_resource(store: &MemoryTreeStore, title: &str) -> ResourceId {
    let resource = Resource::new(
        NewResource {
            resource_type: ResourceType::Course,
            title: title.to_string(),
            description: String::new(),
            tag: None,
            update_date: None,
        },
        Utc::now(),
    );
    let mut tx = store.begin().await.unwrap();
    tx.save_resource(&resource).await.unwrap();
    tx.commit().await.unwrap();
    resource.id
}

/// Local storage with selected operations forced to fail.
#[derive(Debug)]
pub struct FailingStorage {
    inner: LocalStorageBackend,
    fail_moves: bool,
    fail_puts: bool,
    fail_renames: bool,
}

impl FailingStorage {
    fn healthy(inner: LocalStorageBackend) -> Self {
        Self {
            inner,
            fail_moves: false,
            fail_puts: false,
            fail_renames: false,
        }
    }

    fn moves(inner: LocalStorageBackend) -> Self {
        Self {
            fail_moves: true,
            ..Self::healthy(inner)
        }
    }

    fn puts(inner: LocalStorageBackend) -> Self {
        Self {
            fail_puts: true,
            ..Self::healthy(inner)
        }
    }

    fn renames(inner: LocalStorageBackend) -> Self {
        Self {
            fail_renames: true,
            ..Self::healthy(inner)
        }
    }
}

#[async_trait]
impl StorageBackend for FailingStorage {
    fn backend_type(&self) -> &str {
        "failing"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, resource_id: ResourceId, logical_name: &str, data: Bytes) -> AppResult<String> {
        if self.fail_puts {
            return Err(AppError::io_failure("disk full"));
        }
        self.inner.put(resource_id, logical_name, data).await
    }

    async fn move_with_suffix(&self, path: &str, suffix: &str) -> AppResult<String> {
        if self.fail_moves {
            return Err(AppError::io_failure("permission denied"));
        }
        self.inner.move_with_suffix(path, suffix).await
    }

    async fn rename(&self, path: &str, new_logical_name: &str) -> AppResult<String> {
        if self.fail_renames {
            return Err(AppError::io_failure("read-only file system"));
        }
        self.inner.rename(path, new_logical_name).await
    }

    async fn size_of(&self, path: &str) -> AppResult<u64> {
        self.inner.size_of(path).await
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        self.inner.read_bytes(path).await
    }

    async fn read_stream(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read_stream(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.inner.local_path(path)
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum app for making test requests
    pub router: Router,
    pub state: AppState,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the default config.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.database.url = "memory://".to_string();
        config.storage.upload_dir = dir.path().to_string_lossy().into_owned();
        config.preview.circuit.enabled = false;
        config.preview.document.enabled = false;
        adjust(&mut config);

        let store: Arc<dyn TreeStore> = Arc::new(MemoryTreeStore::new());
        let storage: Arc<dyn StorageBackend> =
            Arc::new(LocalStorageBackend::new(dir.path()).await.unwrap());
        let state = AppState::new(config, store, storage);

        Self {
            router: build_app(state.clone()),
            state,
            _dir: dir,
        }
    }

    /// Send a request with an optional JSON body.
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body = body
            .map(|b| serde_json::to_vec(&b).unwrap())
            .unwrap_or_default();
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    /// Send a multipart request with one part per `(field, file name, content)`.
    pub async fn upload(&self, path: &str, parts: &[(&str, &str, &[u8])]) -> TestResponse {
        let mut body = Vec::new();
        for (field, file_name, content) in parts {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    /// Create a resource over HTTP and return its id.
    pub async fn create_resource(&self, title: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/resources",
                Some(serde_json::json!({ "type": "course", "title": title })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` for non-JSON responses
    pub body: Value,
    pub raw: Bytes,
}
