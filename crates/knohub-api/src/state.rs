//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use knohub_core::config::AppConfig;
use knohub_core::traits::StorageBackend;
use knohub_database::TreeStore;
use knohub_service::{FileTreeEngine, PreviewService, ResourceService, VisitorTracker};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    pub store: Arc<dyn TreeStore>,
    pub storage: Arc<dyn StorageBackend>,

    // ── Services ─────────────────────────────────────────────
    pub engine: Arc<FileTreeEngine>,
    pub preview_service: Arc<PreviewService>,
    pub resource_service: Arc<ResourceService>,
    pub visitors: Arc<VisitorTracker>,
}

impl AppState {
    /// Wire every service on top of a store and a storage backend.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn TreeStore>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let engine = Arc::new(FileTreeEngine::new(Arc::clone(&store), Arc::clone(&storage)));
        let preview_service = Arc::new(PreviewService::new(
            Arc::clone(&engine),
            config.preview.clone(),
        ));
        Self::with_preview(config, store, storage, engine, preview_service)
    }

    /// Same as [`AppState::new`] with a prepared preview service.
    pub fn with_preview(
        config: AppConfig,
        store: Arc<dyn TreeStore>,
        storage: Arc<dyn StorageBackend>,
        engine: Arc<FileTreeEngine>,
        preview_service: Arc<PreviewService>,
    ) -> Self {
        let resource_service = Arc::new(ResourceService::new(
            Arc::clone(&store),
            Arc::clone(&engine),
            Arc::clone(&preview_service),
        ));
        let visitors = Arc::new(VisitorTracker::with_retention_hours(
            config.metrics.visitor_retention_hours,
        ));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            store,
            storage,
            engine,
            preview_service,
            resource_service,
            visitors,
        }
    }
}
