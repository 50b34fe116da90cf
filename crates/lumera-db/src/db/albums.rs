use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use lumera_core::models::{Album, Asset, AssetRow, NewAlbum, Page, PageRequest};
use lumera_core::AppError;

use crate::traits::AlbumIndex;

/// Album repository
///
/// Membership is a plain (album_id, asset_id) set; adding twice and removing
/// an absent pair are no-ops reported through the returned bool.
#[derive(Clone)]
pub struct AlbumRepository {
    pool: PgPool,
}

impl AlbumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumIndex for AlbumRepository {
    #[tracing::instrument(skip(self, new_album), fields(db.table = "albums", db.operation = "insert"))]
    async fn create(&self, new_album: &NewAlbum) -> Result<Album, AppError> {
        let album: Album = sqlx::query_as::<Postgres, Album>(
            r#"
            INSERT INTO albums (id, name, description, created_by, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_album.name)
        .bind(&new_album.description)
        .bind(&new_album.created_by)
        .bind(new_album.is_public)
        .fetch_one(&self.pool)
        .await?;

        Ok(album)
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Album>, AppError> {
        let album: Option<Album> =
            sqlx::query_as::<Postgres, Album>("SELECT * FROM albums WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(album)
    }

    #[tracing::instrument(skip(self), fields(db.table = "albums", db.operation = "select"))]
    async fn list(&self, page: PageRequest) -> Result<Page<Album>, AppError> {
        let albums: Vec<Album> = sqlx::query_as::<Postgres, Album>(
            "SELECT * FROM albums ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM albums")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(albums, total, page))
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_assets", db.operation = "insert", album_id = %album_id, asset_id = %asset_id))]
    async fn add_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError> {
        let rows_affected = sqlx::query(
            "INSERT INTO album_assets (album_id, asset_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(album_id)
        .bind(asset_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_assets", db.operation = "delete", album_id = %album_id, asset_id = %asset_id))]
    async fn remove_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError> {
        let rows_affected =
            sqlx::query("DELETE FROM album_assets WHERE album_id = $1 AND asset_id = $2")
                .bind(album_id)
                .bind(asset_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_assets", db.operation = "delete", asset_id = %asset_id))]
    async fn remove_from_all(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let rows_affected = sqlx::query("DELETE FROM album_assets WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_assets", db.operation = "select", album_id = %album_id))]
    async fn member_count(&self, album_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM album_assets WHERE album_id = $1",
        )
        .bind(album_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "album_assets", db.operation = "select", album_id = %album_id))]
    async fn list_members(
        &self,
        album_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        let rows: Vec<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(
            r#"
            SELECT a.*, COALESCE(t.names, ARRAY[]::text[]) AS tags
            FROM assets a
            JOIN album_assets aa ON aa.asset_id = a.id
            LEFT JOIN (
                SELECT asset_id, array_agg(name ORDER BY name) AS names
                FROM tags
                GROUP BY asset_id
            ) t ON t.asset_id = a.id
            WHERE aa.album_id = $1
            ORDER BY aa.added_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(album_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.member_count(album_id).await?;

        let items = rows.into_iter().map(Asset::from).collect();
        Ok(Page::new(items, total, page))
    }
}
