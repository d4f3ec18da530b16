//! File item repository implementation.

use sqlx::PgConnection;

use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::types::{FileItemId, ResourceId};
use knohub_entity::file_item::{FileItem, SiblingScope};

use crate::store::{ACTIVE_NAME_CONSTRAINT, DELETE_SEQUENCE_CONSTRAINT};

/// Queries against the `file_items` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileItemRepository;

impl FileItemRepository {
    /// Find an item by id, deleted or not.
    pub async fn find_by_id(conn: &mut PgConnection, id: FileItemId) -> AppResult<Option<FileItem>> {
        sqlx::query_as::<_, FileItem>("SELECT * FROM file_items WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file item", e))
    }

    /// Active items of a sibling scope in display order.
    pub async fn list_active_in_scope(
        conn: &mut PgConnection,
        scope: SiblingScope,
    ) -> AppResult<Vec<FileItem>> {
        sqlx::query_as::<_, FileItem>(
            "SELECT * FROM file_items \
             WHERE resource_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND NOT deleted \
             ORDER BY display_order ASC, created_at ASC, id ASC",
        )
        .bind(scope.resource_id)
        .bind(scope.parent_id)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list siblings", e))
    }

    /// All active items of a resource, grouped by parent in display order.
    pub async fn list_active_in_resource(
        conn: &mut PgConnection,
        resource_id: ResourceId,
    ) -> AppResult<Vec<FileItem>> {
        sqlx::query_as::<_, FileItem>(
            "SELECT * FROM file_items WHERE resource_id = $1 AND NOT deleted \
             ORDER BY parent_id NULLS FIRST, display_order ASC, created_at ASC, id ASC",
        )
        .bind(resource_id)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list resource items", e)
        })
    }

    /// Active item holding `name` in a scope.
    pub async fn find_active_by_name(
        conn: &mut PgConnection,
        scope: SiblingScope,
        name: &str,
    ) -> AppResult<Option<FileItem>> {
        sqlx::query_as::<_, FileItem>(
            "SELECT * FROM file_items \
             WHERE resource_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             AND original_name = $3 AND NOT deleted",
        )
        .bind(scope.resource_id)
        .bind(scope.parent_id)
        .bind(name)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up name", e))
    }

    /// Highest delete sequence assigned to a name in a scope.
    pub async fn max_delete_sequence(
        conn: &mut PgConnection,
        scope: SiblingScope,
        original_name: &str,
    ) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(delete_sequence) FROM file_items \
             WHERE resource_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             AND original_name = $3 AND deleted",
        )
        .bind(scope.resource_id)
        .bind(scope.parent_id)
        .bind(original_name)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read delete sequence", e)
        })
    }

    /// Insert or update an item.
    pub async fn upsert(conn: &mut PgConnection, item: &FileItem) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_items \
             (id, resource_id, parent_id, name, original_name, is_folder, file_type, size, \
              size_bytes, url, storage_path, deleted, delete_sequence, deleted_at, \
              display_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (id) DO UPDATE SET \
             parent_id = EXCLUDED.parent_id, name = EXCLUDED.name, \
             original_name = EXCLUDED.original_name, file_type = EXCLUDED.file_type, \
             size = EXCLUDED.size, size_bytes = EXCLUDED.size_bytes, url = EXCLUDED.url, \
             storage_path = EXCLUDED.storage_path, deleted = EXCLUDED.deleted, \
             delete_sequence = EXCLUDED.delete_sequence, deleted_at = EXCLUDED.deleted_at, \
             display_order = EXCLUDED.display_order, updated_at = EXCLUDED.updated_at",
        )
        .bind(item.id)
        .bind(item.resource_id)
        .bind(item.parent_id)
        .bind(&item.name)
        .bind(&item.original_name)
        .bind(item.is_folder)
        .bind(&item.file_type)
        .bind(&item.size)
        .bind(item.size_bytes)
        .bind(&item.url)
        .bind(&item.storage_path)
        .bind(item.deleted)
        .bind(item.delete_sequence)
        .bind(item.deleted_at)
        .bind(item.display_order)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some(ACTIVE_NAME_CONSTRAINT) =>
            {
                AppError::name_conflict(format!(
                    "An item named '{}' already exists here",
                    item.original_name
                ))
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some(DELETE_SEQUENCE_CONSTRAINT) =>
            {
                AppError::database(format!(
                    "Delete sequence already used for '{}'",
                    item.original_name
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to save file item", e),
        })?;
        Ok(())
    }
}
