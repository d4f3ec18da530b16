//! PostgreSQL tree store backed by a sqlx transaction per unit of work.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::{FileItem, SiblingScope};
use knohub_entity::resource::{Resource, ResourceType};

use super::{TreeStore, TreeTransaction};
use crate::repositories::{FileItemRepository, ResourceRepository};

/// Tree store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgTreeStore {
    pool: PgPool,
}

impl PgTreeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TreeStore for PgTreeStore {
    fn store_type(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    async fn begin(&self) -> AppResult<Box<dyn TreeTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgTreeTransaction { tx }))
    }
}

/// A unit of work over [`PgTreeStore`]; rolls back when dropped uncommitted.
#[derive(Debug)]
pub struct PgTreeTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TreeTransaction for PgTreeTransaction {
    async fn find_resource(&mut self, id: ResourceId) -> AppResult<Option<Resource>> {
        ResourceRepository::find_active(&mut self.tx, id).await
    }

    async fn list_resources(&mut self) -> AppResult<Vec<Resource>> {
        ResourceRepository::list_active(&mut self.tx).await
    }

    async fn list_resources_by_type(
        &mut self,
        resource_type: ResourceType,
    ) -> AppResult<Vec<Resource>> {
        ResourceRepository::list_by_type(&mut self.tx, resource_type).await
    }

    async fn search_resources(&mut self, keyword: &str) -> AppResult<Vec<Resource>> {
        ResourceRepository::search(&mut self.tx, keyword).await
    }

    async fn save_resource(&mut self, resource: &Resource) -> AppResult<()> {
        ResourceRepository::upsert(&mut self.tx, resource).await
    }

    async fn find_item(&mut self, id: FileItemId) -> AppResult<Option<FileItem>> {
        FileItemRepository::find_by_id(&mut self.tx, id).await
    }

    async fn list_active_in_scope(&mut self, scope: SiblingScope) -> AppResult<Vec<FileItem>> {
        FileItemRepository::list_active_in_scope(&mut self.tx, scope).await
    }

    async fn list_active_in_resource(
        &mut self,
        resource_id: ResourceId,
    ) -> AppResult<Vec<FileItem>> {
        FileItemRepository::list_active_in_resource(&mut self.tx, resource_id).await
    }

    async fn find_active_by_name(
        &mut self,
        scope: SiblingScope,
        name: &str,
    ) -> AppResult<Option<FileItem>> {
        FileItemRepository::find_active_by_name(&mut self.tx, scope, name).await
    }

    async fn max_delete_sequence(
        &mut self,
        scope: SiblingScope,
        original_name: &str,
    ) -> AppResult<Option<i32>> {
        FileItemRepository::max_delete_sequence(&mut self.tx, scope, original_name).await
    }

    async fn save_item(&mut self, item: &FileItem) -> AppResult<()> {
        FileItemRepository::upsert(&mut self.tx, item).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }
}
