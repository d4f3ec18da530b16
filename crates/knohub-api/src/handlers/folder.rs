//! Folder creation and recursive deletion handlers.

use axum::Json;
use axum::extract::{Path, State};

use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::FileItemNode;

use crate::dto::request::CreateFolderRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{ValidatedJson, parse_id};
use crate::state::AppState;

/// POST /api/files/{id}/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> ApiResult<Json<ApiResponse<FileItemNode>>> {
    let resource_id: ResourceId = parse_id(&id)?;
    let folder = state
        .engine
        .create_folder(resource_id, req.parent_folder_id, &req.name)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Folder created",
        FileItemNode::from_item(&folder, None),
    )))
}

/// DELETE /api/files/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id: FileItemId = parse_id(&id)?;
    state.engine.soft_delete_folder(id).await?;
    Ok(Json(ApiResponse::message("Folder deleted")))
}
