use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use lumera_core::models::Variant;
use lumera_core::AppError;

use crate::traits::VariantIndex;

/// Variant repository
///
/// Rows are keyed by (asset_id, name); storage keys are deterministic, so a
/// reprocessed variant lands on the same row and the same object.
#[derive(Clone)]
pub struct VariantRepository {
    pool: PgPool,
}

impl VariantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VariantIndex for VariantRepository {
    #[tracing::instrument(skip(self, variant), fields(db.table = "variants", db.operation = "upsert", asset_id = %variant.asset_id, variant = %variant.name))]
    async fn upsert(&self, variant: &Variant) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO variants (
                id, asset_id, name, storage_key, width, height,
                file_size, content_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (asset_id, name) DO UPDATE SET
                storage_key = EXCLUDED.storage_key,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                file_size = EXCLUDED.file_size,
                content_type = EXCLUDED.content_type,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(variant.id)
        .bind(variant.asset_id)
        .bind(&variant.name)
        .bind(&variant.storage_key)
        .bind(variant.width)
        .bind(variant.height)
        .bind(variant.file_size)
        .bind(&variant.content_type)
        .bind(variant.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "variants", db.operation = "select", asset_id = %asset_id, variant = %name))]
    async fn get(&self, asset_id: Uuid, name: &str) -> Result<Option<Variant>, AppError> {
        let variant: Option<Variant> = sqlx::query_as::<Postgres, Variant>(
            "SELECT * FROM variants WHERE asset_id = $1 AND name = $2",
        )
        .bind(asset_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    #[tracing::instrument(skip(self), fields(db.table = "variants", db.operation = "select", asset_id = %asset_id))]
    async fn list_for_asset(&self, asset_id: Uuid) -> Result<Vec<Variant>, AppError> {
        let variants: Vec<Variant> = sqlx::query_as::<Postgres, Variant>(
            "SELECT * FROM variants WHERE asset_id = $1 ORDER BY name",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    #[tracing::instrument(skip(self), fields(db.table = "variants", db.operation = "delete", asset_id = %asset_id))]
    async fn delete_for_asset(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let rows_affected = sqlx::query("DELETE FROM variants WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
