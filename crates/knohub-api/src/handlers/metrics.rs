//! Visitor metrics handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ActiveUsersResponse, ApiResponse};
use crate::state::AppState;

/// GET /api/metrics/active-users
pub async fn active_users(State(state): State<AppState>) -> Json<ApiResponse<ActiveUsersResponse>> {
    Json(ApiResponse::ok(ActiveUsersResponse {
        active_users: state.visitors.active_count(),
    }))
}
