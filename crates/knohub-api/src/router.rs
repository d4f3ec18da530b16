//! Route definitions for the KnoHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with every route, the body limit, and request logging.
pub fn build_router(state: AppState) -> Router {
    let max_upload =
        usize::try_from(state.config.storage.max_upload_size_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(resource_routes())
        .merge(file_routes())
        .merge(folder_routes())
        .merge(metrics_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Resource CRUD, type filter, and search
fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/resources",
            get(handlers::resource::list_resources).post(handlers::resource::create_resource),
        )
        .route("/resources/search", get(handlers::resource::search_resources))
        .route("/resources/type/{type}", get(handlers::resource::list_by_type))
        .route(
            "/resources/{id}",
            get(handlers::resource::get_resource)
                .put(handlers::resource::update_resource)
                .delete(handlers::resource::delete_resource),
        )
}

/// File tree, uploads, rename, reorder, previews, downloads
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files/reorder", post(handlers::file::reorder_items))
        .route(
            "/files/{id}",
            get(handlers::file::file_tree).delete(handlers::file::delete_file),
        )
        .route("/files/{id}/upload", post(handlers::file::upload_file))
        .route("/files/{id}/upload/batch", post(handlers::file::upload_batch))
        .route("/files/{id}/rename", put(handlers::file::rename_item))
        .route("/files/{id}/html", get(handlers::file::document_html))
        .route("/files/{id}/preview", get(handlers::file::preview_image))
        .route(
            "/files/{id}/download/{filename}",
            get(handlers::file::download_file),
        )
}

/// Folder creation and recursive delete
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/files/{id}/folders", post(handlers::folder::create_folder))
        .route("/files/folders/{id}", delete(handlers::folder::delete_folder))
}

fn metrics_routes() -> Router<AppState> {
    Router::new().route("/metrics/active-users", get(handlers::metrics::active_users))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
