use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use lumera_core::models::{Asset, AssetFilter, AssetRow, Page, PageRequest};
use lumera_core::AppError;

use crate::traits::AssetIndex;

/// Asset repository
///
/// Owns the `assets` table, including the guarded status transitions the
/// pipeline relies on. Tag names are aggregated into each returned asset so
/// callers never issue a second query.
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Guarded status transition; returns whether a row moved.
    async fn transition(&self, id: Uuid, sql: &str) -> Result<bool, AppError> {
        let rows_affected = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl AssetIndex for AssetRepository {
    #[tracing::instrument(skip(self, asset), fields(db.table = "assets", db.operation = "insert", db.record_id = %asset.id))]
    async fn insert(&self, asset: &Asset) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO assets (
                id, filename, original_filename, content_type, media_kind,
                status, storage_key, file_size, width, height,
                description, uploaded_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(asset.id)
        .bind(&asset.filename)
        .bind(&asset.original_filename)
        .bind(&asset.content_type)
        .bind(asset.media_kind)
        .bind(asset.status)
        .bind(&asset.storage_key)
        .bind(asset.file_size)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.description)
        .bind(&asset.uploaded_by)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        let row: Option<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(
            r#"
            SELECT a.*, COALESCE(t.names, ARRAY[]::text[]) AS tags
            FROM assets a
            LEFT JOIN (
                SELECT asset_id, array_agg(name ORDER BY name) AS names
                FROM tags
                GROUP BY asset_id
            ) t ON t.asset_id = a.id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Asset::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "update", db.record_id = %id))]
    async fn mark_processing(&self, id: Uuid) -> Result<bool, AppError> {
        self.transition(
            id,
            "UPDATE assets SET status = 'processing', updated_at = NOW() \
             WHERE id = $1 AND status = 'uploading'",
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "update", db.record_id = %id))]
    async fn mark_ready(&self, id: Uuid) -> Result<bool, AppError> {
        self.transition(
            id,
            "UPDATE assets SET status = 'ready', updated_at = NOW() \
             WHERE id = $1 AND status = 'processing'",
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "update", db.record_id = %id))]
    async fn mark_error(&self, id: Uuid) -> Result<bool, AppError> {
        self.transition(
            id,
            "UPDATE assets SET status = 'error', updated_at = NOW() \
             WHERE id = $1 AND status IN ('uploading', 'processing')",
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "update", db.record_id = %id))]
    async fn resume_processing(&self, id: Uuid) -> Result<bool, AppError> {
        self.transition(
            id,
            "UPDATE assets SET status = 'processing', updated_at = NOW() \
             WHERE id = $1 AND status = 'error'",
        )
        .await
    }

    #[tracing::instrument(skip(self, description), fields(db.table = "assets", db.operation = "update", db.record_id = %id))]
    async fn update_description(&self, id: Uuid, description: &str) -> Result<bool, AppError> {
        let rows_affected =
            sqlx::query("UPDATE assets SET description = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(description)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select"))]
    async fn search(
        &self,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        let rows: Vec<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(
            r#"
            SELECT a.*, COALESCE(t.names, ARRAY[]::text[]) AS tags
            FROM assets a
            LEFT JOIN (
                SELECT asset_id, array_agg(name ORDER BY name) AS names
                FROM tags
                GROUP BY asset_id
            ) t ON t.asset_id = a.id
            WHERE ($1::media_kind IS NULL OR a.media_kind = $1)
              AND ($2::text[] IS NULL OR EXISTS (
                  SELECT 1 FROM tags tg
                  WHERE tg.asset_id = a.id AND tg.name = ANY($2)
              ))
            ORDER BY a.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.media_kind)
        .bind(filter.tags.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*)
            FROM assets a
            WHERE ($1::media_kind IS NULL OR a.media_kind = $1)
              AND ($2::text[] IS NULL OR EXISTS (
                  SELECT 1 FROM tags tg
                  WHERE tg.asset_id = a.id AND tg.name = ANY($2)
              ))
            "#,
        )
        .bind(filter.media_kind)
        .bind(filter.tags.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let items = rows.into_iter().map(Asset::from).collect();
        Ok(Page::new(items, total, page))
    }
}
