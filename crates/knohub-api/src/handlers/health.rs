//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, ComponentHealth, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let store_ok = state.store.health_check().await.unwrap_or(false);
    let storage_ok = state.storage.health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if store_ok && storage_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        store: ComponentHealth {
            kind: state.store.store_type().to_string(),
            healthy: store_ok,
        },
        storage: ComponentHealth {
            kind: state.storage.backend_type().to_string(),
            healthy: storage_ok,
        },
    }))
}
