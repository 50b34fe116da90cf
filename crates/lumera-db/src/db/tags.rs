use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use lumera_core::models::TagOrigin;
use lumera_core::AppError;

use crate::traits::TagIndex;

/// Tag repository
///
/// Names are case-sensitive; (asset_id, name) is unique, so re-adding an
/// existing tag is a silent no-op rather than a conflict error.
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagIndex for TagRepository {
    #[tracing::instrument(skip(self, names), fields(db.table = "tags", db.operation = "insert", asset_id = %asset_id, count = names.len()))]
    async fn add(
        &self,
        asset_id: Uuid,
        names: &[String],
        origin: TagOrigin,
        created_by: Option<&str>,
    ) -> Result<u64, AppError> {
        if names.is_empty() {
            return Ok(0);
        }

        let rows_affected = sqlx::query(
            r#"
            INSERT INTO tags (id, asset_id, name, origin, created_by)
            SELECT gen_random_uuid(), $1, name, $2, $3
            FROM unnest($4::text[]) AS u(name)
            ON CONFLICT (asset_id, name) DO NOTHING
            "#,
        )
        .bind(asset_id)
        .bind(origin)
        .bind(created_by)
        .bind(names)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(skip(self, names), fields(db.table = "tags", db.operation = "delete", asset_id = %asset_id, count = names.len()))]
    async fn remove(&self, asset_id: Uuid, names: &[String]) -> Result<u64, AppError> {
        if names.is_empty() {
            return Ok(0);
        }

        let rows_affected =
            sqlx::query("DELETE FROM tags WHERE asset_id = $1 AND name = ANY($2)")
                .bind(asset_id)
                .bind(names)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select", asset_id = %asset_id))]
    async fn list_names(&self, asset_id: Uuid) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar::<Postgres, String>(
            "SELECT name FROM tags WHERE asset_id = $1 ORDER BY name",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "delete", asset_id = %asset_id))]
    async fn delete_all(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let rows_affected = sqlx::query("DELETE FROM tags WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
