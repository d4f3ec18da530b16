//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use knohub_core::result::AppResult;
use knohub_core::types::FileItemId;
use knohub_entity::file_item::DropPosition;
use knohub_entity::resource::{NewResource, ResourceTag, ResourceType, UpdateResource};

/// Body of `POST /api/resources`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    /// `course`, `tech` or `info`.
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Resource type is required"))]
    pub resource_type: String,
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub description: String,
    /// `New`, `Hot` or `Rec`.
    pub tag: Option<String>,
    pub update_date: Option<NaiveDate>,
}

impl CreateResourceRequest {
    pub fn into_new_resource(self) -> AppResult<NewResource> {
        Ok(NewResource {
            resource_type: self.resource_type.parse()?,
            title: self.title.trim().to_string(),
            description: self.description,
            tag: parse_tag(self.tag.as_deref())?,
            update_date: self.update_date,
        })
    }
}

/// Body of `PUT /api/resources/{id}`; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub tag: Option<String>,
    pub update_date: Option<NaiveDate>,
}

impl UpdateResourceRequest {
    pub fn into_update(self) -> AppResult<UpdateResource> {
        Ok(UpdateResource {
            resource_type: self
                .resource_type
                .as_deref()
                .map(str::parse::<ResourceType>)
                .transpose()?,
            title: self.title.map(|title| title.trim().to_string()),
            description: self.description,
            tag: parse_tag(self.tag.as_deref())?,
            update_date: self.update_date,
        })
    }
}

fn parse_tag(tag: Option<&str>) -> AppResult<Option<ResourceTag>> {
    match tag.map(str::trim) {
        None | Some("") => Ok(None),
        Some(tag) => tag.parse().map(Some),
    }
}

/// Query of `GET /api/resources/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}

/// Query of the upload endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub folder_id: Option<FileItemId>,
}

/// Body of `POST /api/files/{id}/folders`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
    pub parent_folder_id: Option<FileItemId>,
}

/// Body of `PUT /api/files/{id}/rename`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub new_name: String,
}

/// Body of `POST /api/files/reorder`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub drag_id: FileItemId,
    pub drop_id: FileItemId,
    /// `before`, `after` or `inside`.
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
}

impl ReorderRequest {
    pub fn position(&self) -> AppResult<DropPosition> {
        self.position.parse()
    }
}
