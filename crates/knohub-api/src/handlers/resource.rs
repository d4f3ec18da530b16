//! Resource CRUD and lookup handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use knohub_core::types::ResourceId;
use knohub_entity::resource::ResourceView;

use crate::dto::request::{CreateResourceRequest, SearchQuery, UpdateResourceRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{ValidatedJson, parse_id};
use crate::state::AppState;

/// GET /api/resources
pub async fn list_resources(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ResourceView>>>> {
    let resources = state.resource_service.list().await?;
    Ok(Json(ApiResponse::ok(resources)))
}

/// GET /api/resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ResourceView>>> {
    let id: ResourceId = parse_id(&id)?;
    let resource = state.resource_service.get(id).await?;
    Ok(Json(ApiResponse::ok(resource)))
}

/// GET /api/resources/type/{type}
pub async fn list_by_type(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<ResourceView>>>> {
    let resources = state.resource_service.by_type(&resource_type).await?;
    Ok(Json(ApiResponse::ok(resources)))
}

/// GET /api/resources/search?keyword=
pub async fn search_resources(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ResourceView>>>> {
    let resources = state.resource_service.search(&query.keyword).await?;
    Ok(Json(ApiResponse::ok(resources)))
}

/// POST /api/resources
pub async fn create_resource(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateResourceRequest>,
) -> ApiResult<Json<ApiResponse<ResourceView>>> {
    let resource = state
        .resource_service
        .create(req.into_new_resource()?)
        .await?;
    Ok(Json(ApiResponse::ok_with_message("Resource created", resource)))
}

/// PUT /api/resources/{id}
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateResourceRequest>,
) -> ApiResult<Json<ApiResponse<ResourceView>>> {
    let id: ResourceId = parse_id(&id)?;
    let resource = state
        .resource_service
        .update(id, req.into_update()?)
        .await?;
    Ok(Json(ApiResponse::ok_with_message("Resource updated", resource)))
}

/// DELETE /api/resources/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id: ResourceId = parse_id(&id)?;
    state.resource_service.delete(id).await?;
    Ok(Json(ApiResponse::message("Resource deleted")))
}
