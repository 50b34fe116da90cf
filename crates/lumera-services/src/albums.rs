//! Album management
//!
//! Albums are named collections of assets. Membership is many-to-many and
//! idempotent in both directions.

use std::sync::Arc;

use uuid::Uuid;

use lumera_core::models::{Album, Asset, NewAlbum, Page, PageRequest};
use lumera_core::AppError;
use lumera_db::{AlbumIndex, AssetIndex};

#[derive(Clone)]
pub struct AlbumService {
    albums: Arc<dyn AlbumIndex>,
    assets: Arc<dyn AssetIndex>,
}

impl AlbumService {
    pub fn new(albums: Arc<dyn AlbumIndex>, assets: Arc<dyn AssetIndex>) -> Self {
        Self { albums, assets }
    }

    #[tracing::instrument(skip(self, album), fields(name = %album.name))]
    pub async fn create_album(&self, album: NewAlbum) -> Result<Album, AppError> {
        if album.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Album name must not be empty".to_string(),
            ));
        }
        let created = self.albums.create(&album).await?;
        tracing::info!(album_id = %created.id, "Album created");
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_album(&self, id: Uuid) -> Result<Album, AppError> {
        self.albums
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {} not found", id)))
    }

    #[tracing::instrument(skip(self, page))]
    pub async fn list_albums(&self, page: PageRequest) -> Result<Page<Album>, AppError> {
        self.albums.list(page).await
    }

    /// Add an asset to an album. Adding an existing member is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_album(&self, album_id: Uuid, asset_id: Uuid) -> Result<(), AppError> {
        self.get_album(album_id).await?;
        if self.assets.get(asset_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Asset {} not found", asset_id)));
        }
        if !self.albums.add_member(album_id, asset_id).await? {
            tracing::debug!(album_id = %album_id, asset_id = %asset_id, "Asset already in album");
        }
        Ok(())
    }

    /// Remove an asset from an album. Removing a non-member is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_album(&self, album_id: Uuid, asset_id: Uuid) -> Result<(), AppError> {
        self.get_album(album_id).await?;
        if !self.albums.remove_member(album_id, asset_id).await? {
            tracing::debug!(album_id = %album_id, asset_id = %asset_id, "Asset was not in album");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, page))]
    pub async fn list_album_assets(
        &self,
        album_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        self.get_album(album_id).await?;
        self.albums.list_members(album_id, page).await
    }
}
