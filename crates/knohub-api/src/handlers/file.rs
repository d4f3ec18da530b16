//! File tree, upload, rename, reorder, preview, and download handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio_util::io::ReaderStream;

use knohub_core::error::AppError;
use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::{FileItem, FileItemNode};
use knohub_service::UploadedFile;

use crate::dto::request::{ReorderRequest, RenameRequest, UploadQuery};
use crate::dto::response::ApiResponse;
use crate::error::{ApiResult, PAYLOAD_TOO_LARGE_MESSAGE};
use crate::extractors::{ValidatedJson, parse_id};
use crate::state::AppState;

/// Characters left unescaped in RFC 5987 `filename*` values.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE)
    } else {
        AppError::validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Drain every multipart part named `field` into uploaded files.
async fn read_files(multipart: &mut Multipart, field: &str) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(part) = multipart.next_field().await.map_err(multipart_error)? {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part.file_name().map(str::to_string);
        let data = part.bytes().await.map_err(multipart_error)?;
        files.push(UploadedFile { file_name, data });
    }
    Ok(files)
}

fn node(state: &AppState, item: &FileItem) -> FileItemNode {
    FileItemNode::from_item(item, state.preview_service.preview_url(item))
}

fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// GET /api/files/{id}
pub async fn file_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<FileItemNode>>>> {
    let resource_id: ResourceId = parse_id(&id)?;
    let tree = state.resource_service.tree(resource_id).await?;
    Ok(Json(ApiResponse::ok(tree)))
}

/// POST /api/files/{id}/upload?folderId=
pub async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<FileItemNode>>> {
    let resource_id: ResourceId = parse_id(&id)?;
    let file = read_files(&mut multipart, "file")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::validation("Multipart field 'file' is required"))?;

    let item = state
        .engine
        .upload(resource_id, query.folder_id, file)
        .await?;
    state.preview_service.after_upload(&item).await;

    Ok(Json(ApiResponse::ok_with_message(
        "File uploaded",
        node(&state, &item),
    )))
}

/// POST /api/files/{id}/upload/batch?folderId=
pub async fn upload_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<Vec<FileItemNode>>>> {
    let resource_id: ResourceId = parse_id(&id)?;
    let files = read_files(&mut multipart, "files").await?;
    if files.is_empty() {
        return Err(AppError::validation("Multipart field 'files' is required").into());
    }

    let items = state
        .engine
        .upload_batch(resource_id, query.folder_id, files)
        .await?;
    for item in &items {
        state.preview_service.after_upload(item).await;
    }

    let nodes = items.iter().map(|item| node(&state, item)).collect();
    Ok(Json(ApiResponse::ok_with_message("Files uploaded", nodes)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id: FileItemId = parse_id(&id)?;
    state.engine.soft_delete_file(id).await?;
    Ok(Json(ApiResponse::message("File deleted")))
}

/// PUT /api/files/{id}/rename
pub async fn rename_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> ApiResult<Json<ApiResponse<FileItemNode>>> {
    let id: FileItemId = parse_id(&id)?;
    let item = state.engine.rename(id, &req.new_name).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Renamed",
        node(&state, &item),
    )))
}

/// POST /api/files/reorder
pub async fn reorder_items(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ReorderRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let position = req.position()?;
    state
        .engine
        .reorder(req.drag_id, req.drop_id, position)
        .await?;
    Ok(Json(ApiResponse::message("Order updated")))
}

/// GET /api/files/{id}/html
pub async fn document_html(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<String>>> {
    let id: FileItemId = parse_id(&id)?;
    let html = state.preview_service.render_doc_html(id).await?;
    Ok(Json(ApiResponse::ok(html)))
}

/// GET /api/files/{id}/preview
pub async fn preview_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: FileItemId = parse_id(&id)?;
    let path = state.preview_service.preview_path(id).await?;

    let file = tokio::fs::File::open(&path).await.map_err(AppError::from)?;
    let length = file.metadata().await.map_err(AppError::from)?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&name))
        .header(header::CONTENT_LENGTH, length)
        .header(header::CONTENT_DISPOSITION, "inline")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// GET /api/files/{id}/download/{filename}
pub async fn download_file(
    State(state): State<AppState>,
    Path((id, file_name)): Path<(String, String)>,
) -> ApiResult<Response> {
    let resource_id: ResourceId = parse_id(&id)?;
    let download = state.engine.open_download(resource_id, &file_name).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&download.file_name))
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename*=UTF-8''{}",
                utf8_percent_encode(&download.file_name, ATTR_CHAR)
            ),
        );
    if let Some(size) = download.size {
        builder = builder.header(header::CONTENT_LENGTH, size);
    }

    let response = builder
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
