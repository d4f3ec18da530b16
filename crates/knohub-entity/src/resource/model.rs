//! Resource entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use knohub_core::types::ResourceId;

use super::kind::{ResourceTag, ResourceType};
use crate::file_item::FileItemNode;

/// A named collection that owns a forest of file items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub tag: Option<ResourceTag>,
    /// Date shown to readers as the last content update.
    pub update_date: NaiveDate,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub tag: Option<ResourceTag>,
    /// Defaults to today when absent.
    pub update_date: Option<NaiveDate>,
}

/// Partial update of a resource; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateResource {
    pub resource_type: Option<ResourceType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<ResourceTag>,
    pub update_date: Option<NaiveDate>,
}

impl Resource {
    pub fn new(data: NewResource, now: DateTime<Utc>) -> Self {
        Self {
            id: ResourceId::new(),
            resource_type: data.resource_type,
            title: data.title,
            description: data.description,
            tag: data.tag,
            update_date: data.update_date.unwrap_or_else(|| now.date_naive()),
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: UpdateResource, now: DateTime<Utc>) {
        if let Some(resource_type) = update.resource_type {
            self.resource_type = resource_type;
        }
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(tag) = update.tag {
            self.tag = Some(tag);
        }
        if let Some(update_date) = update.update_date {
            self.update_date = update_date;
        }
        self.updated_at = now;
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

/// A resource together with its nested file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub tag: Option<ResourceTag>,
    pub update_date: NaiveDate,
    pub files: Vec<FileItemNode>,
}

impl ResourceView {
    pub fn new(resource: Resource, files: Vec<FileItemNode>) -> Self {
        Self {
            id: resource.id,
            resource_type: resource.resource_type,
            title: resource.title,
            description: resource.description,
            tag: resource.tag,
            update_date: resource.update_date,
            files,
        }
    }
}
