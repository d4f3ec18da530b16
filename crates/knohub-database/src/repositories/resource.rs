//! Resource repository implementation.

use sqlx::PgConnection;

use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::types::ResourceId;
use knohub_entity::resource::{Resource, ResourceType};

/// Queries against the `resources` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceRepository;

impl ResourceRepository {
    /// Find an active resource by id.
    pub async fn find_active(conn: &mut PgConnection, id: ResourceId) -> AppResult<Option<Resource>> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1 AND NOT deleted")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find resource", e))
    }

    /// List active resources, newest first.
    pub async fn list_active(conn: &mut PgConnection) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE NOT deleted ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list resources", e))
    }

    /// List active resources of one type, newest first.
    pub async fn list_by_type(
        conn: &mut PgConnection,
        resource_type: ResourceType,
    ) -> AppResult<Vec<Resource>> {
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE NOT deleted AND resource_type = $1 \
             ORDER BY created_at DESC, id ASC",
        )
        .bind(resource_type)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list resources by type", e)
        })
    }

    /// Case-insensitive substring search over title and description.
    pub async fn search(conn: &mut PgConnection, keyword: &str) -> AppResult<Vec<Resource>> {
        let pattern = format!("%{}%", escape_like(&keyword.to_lowercase()));
        sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE NOT deleted \
             AND (LOWER(title) LIKE $1 ESCAPE '\\' OR LOWER(description) LIKE $1 ESCAPE '\\') \
             ORDER BY created_at DESC, id ASC",
        )
        .bind(pattern)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search resources", e))
    }

    /// Insert or update a resource.
    pub async fn upsert(conn: &mut PgConnection, resource: &Resource) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO resources \
             (id, resource_type, title, description, tag, update_date, deleted, deleted_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
             resource_type = EXCLUDED.resource_type, title = EXCLUDED.title, \
             description = EXCLUDED.description, tag = EXCLUDED.tag, \
             update_date = EXCLUDED.update_date, deleted = EXCLUDED.deleted, \
             deleted_at = EXCLUDED.deleted_at, updated_at = EXCLUDED.updated_at",
        )
        .bind(resource.id)
        .bind(resource.resource_type)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.tag)
        .bind(resource.update_date)
        .bind(resource.deleted)
        .bind(resource.deleted_at)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save resource", e))?;
        Ok(())
    }
}

/// Escape `LIKE` metacharacters so the keyword matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
