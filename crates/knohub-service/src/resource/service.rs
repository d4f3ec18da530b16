//! Resource CRUD with nested file trees.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use knohub_core::error::AppError;
use knohub_core::result::AppResult;
use knohub_core::types::ResourceId;
use knohub_database::TreeStore;
use knohub_entity::file_item::{FileItem, FileItemNode};
use knohub_entity::resource::{NewResource, Resource, ResourceType, ResourceView, UpdateResource};

use crate::preview::PreviewService;
use crate::tree::FileTreeEngine;

/// Manages resources and presents them with their file trees.
#[derive(Debug, Clone)]
pub struct ResourceService {
    store: Arc<dyn TreeStore>,
    engine: Arc<FileTreeEngine>,
    preview: Arc<PreviewService>,
}

impl ResourceService {
    pub fn new(
        store: Arc<dyn TreeStore>,
        engine: Arc<FileTreeEngine>,
        preview: Arc<PreviewService>,
    ) -> Self {
        Self {
            store,
            engine,
            preview,
        }
    }

    /// Nested tree of a resource's active items, with preview locators.
    pub async fn tree(&self, id: ResourceId) -> AppResult<Vec<FileItemNode>> {
        let preview_url = |item: &FileItem| self.preview.preview_url(item);
        self.engine.list_tree(id, &preview_url).await
    }

    async fn views(&self, resources: Vec<Resource>) -> AppResult<Vec<ResourceView>> {
        let mut views = Vec::with_capacity(resources.len());
        for resource in resources {
            let files = self.tree(resource.id).await?;
            views.push(ResourceView::new(resource, files));
        }
        Ok(views)
    }

    /// Active resources, newest first.
    pub async fn list(&self) -> AppResult<Vec<ResourceView>> {
        let resources = {
            let mut tx = self.store.begin().await?;
            tx.list_resources().await?
        };
        self.views(resources).await
    }

    pub async fn get(&self, id: ResourceId) -> AppResult<ResourceView> {
        let resource = self.find(id).await?;
        let files = self.tree(id).await?;
        Ok(ResourceView::new(resource, files))
    }

    /// Active resources of a type given by name, e.g. `"course"`.
    pub async fn by_type(&self, resource_type: &str) -> AppResult<Vec<ResourceView>> {
        let resource_type: ResourceType = resource_type.parse()?;
        let resources = {
            let mut tx = self.store.begin().await?;
            tx.list_resources_by_type(resource_type).await?
        };
        self.views(resources).await
    }

    /// Case-insensitive substring search over titles and descriptions.
    pub async fn search(&self, keyword: &str) -> AppResult<Vec<ResourceView>> {
        let keyword = keyword.trim();
        let resources = {
            let mut tx = self.store.begin().await?;
            if keyword.is_empty() {
                tx.list_resources().await?
            } else {
                tx.search_resources(keyword).await?
            }
        };
        self.views(resources).await
    }

    pub async fn create(&self, data: NewResource) -> AppResult<ResourceView> {
        if data.title.trim().is_empty() {
            return Err(AppError::validation("Title must not be empty"));
        }

        let resource = Resource::new(data, Utc::now());
        let mut tx = self.store.begin().await?;
        tx.save_resource(&resource).await?;
        tx.commit().await?;

        info!(resource_id = %resource.id, title = %resource.title, "Resource created");
        Ok(ResourceView::new(resource, Vec::new()))
    }

    pub async fn update(&self, id: ResourceId, update: UpdateResource) -> AppResult<ResourceView> {
        if update
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(AppError::validation("Title must not be empty"));
        }

        let resource = {
            let mut tx = self.store.begin().await?;
            let mut resource = tx
                .find_resource(id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Resource {id} not found")))?;
            resource.apply(update, Utc::now());
            tx.save_resource(&resource).await?;
            tx.commit().await?;
            resource
        };

        info!(resource_id = %id, "Resource updated");
        let files = self.tree(id).await?;
        Ok(ResourceView::new(resource, files))
    }

    /// Soft-delete a resource together with all of its items.
    pub async fn delete(&self, id: ResourceId) -> AppResult<()> {
        self.engine.delete_resource(id).await
    }

    async fn find(&self, id: ResourceId) -> AppResult<Resource> {
        let mut tx = self.store.begin().await?;
        tx.find_resource(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Resource {id} not found")))
    }
}
