//! Repository trait abstractions for the service layer
//!
//! These traits define the interface services need from the database,
//! allowing for easy mocking and testing without database dependencies.
//! The Postgres repositories in [`crate::db`] implement them.

use async_trait::async_trait;
use lumera_core::models::{
    Album, Asset, AssetFilter, NewAlbum, Page, PageRequest, TagOrigin, Variant,
};
use lumera_core::AppError;
use uuid::Uuid;

/// Asset records and their status machine.
#[async_trait]
pub trait AssetIndex: Send + Sync {
    /// Persist a freshly built asset record. Tags are managed separately
    /// through [`TagIndex`]; the `tags` field on the value is ignored here.
    async fn insert(&self, asset: &Asset) -> Result<(), AppError>;

    /// Fetch an asset with its tag names aggregated.
    async fn get(&self, id: Uuid) -> Result<Option<Asset>, AppError>;

    /// Delete the asset record. Returns false when no row matched.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Uploading -> Processing. Returns false when the asset was not in
    /// Uploading (already advanced, or deleted).
    async fn mark_processing(&self, id: Uuid) -> Result<bool, AppError>;

    /// Processing -> Ready. Returns false when the asset was not in
    /// Processing (deleted mid-run, or already terminal).
    async fn mark_ready(&self, id: Uuid) -> Result<bool, AppError>;

    /// Uploading | Processing -> Error. Returns false when the asset was
    /// already terminal or deleted.
    async fn mark_error(&self, id: Uuid) -> Result<bool, AppError>;

    /// Error -> Processing, for an explicit reprocessing request.
    /// Returns false when the asset was not in Error.
    async fn resume_processing(&self, id: Uuid) -> Result<bool, AppError>;

    /// Replace the free-form description. Returns false when no row matched.
    async fn update_description(&self, id: Uuid, description: &str) -> Result<bool, AppError>;

    /// Page through assets matching the filter, newest first.
    async fn search(
        &self,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError>;
}

/// Derived rendition records, keyed by (asset, variant name).
#[async_trait]
pub trait VariantIndex: Send + Sync {
    /// Insert or overwrite the variant row for (asset_id, name).
    async fn upsert(&self, variant: &Variant) -> Result<(), AppError>;

    /// Fetch one variant of an asset by name.
    async fn get(&self, asset_id: Uuid, name: &str) -> Result<Option<Variant>, AppError>;

    /// All variants of an asset.
    async fn list_for_asset(&self, asset_id: Uuid) -> Result<Vec<Variant>, AppError>;

    /// Remove all variant rows for an asset; returns the number removed.
    async fn delete_for_asset(&self, asset_id: Uuid) -> Result<u64, AppError>;
}

/// Tag attachments. Names are case-sensitive and unique per asset.
#[async_trait]
pub trait TagIndex: Send + Sync {
    /// Attach tags to an asset, skipping names already present.
    /// Returns the number actually added; an empty slice is a no-op.
    async fn add(
        &self,
        asset_id: Uuid,
        names: &[String],
        origin: TagOrigin,
        created_by: Option<&str>,
    ) -> Result<u64, AppError>;

    /// Detach the named tags; absent names are skipped. Returns the number
    /// removed.
    async fn remove(&self, asset_id: Uuid, names: &[String]) -> Result<u64, AppError>;

    /// Tag names for an asset, sorted.
    async fn list_names(&self, asset_id: Uuid) -> Result<Vec<String>, AppError>;

    /// Remove every tag on an asset; returns the number removed.
    async fn delete_all(&self, asset_id: Uuid) -> Result<u64, AppError>;
}

/// Albums and their unordered asset memberships.
#[async_trait]
pub trait AlbumIndex: Send + Sync {
    async fn create(&self, new_album: &NewAlbum) -> Result<Album, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Album>, AppError>;

    /// Page through albums, newest first.
    async fn list(&self, page: PageRequest) -> Result<Page<Album>, AppError>;

    /// Add an asset to an album. Returns false when it was already a member.
    async fn add_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError>;

    /// Remove an asset from an album. Returns false when it was not a member.
    async fn remove_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError>;

    /// Remove an asset from every album; returns the number of memberships
    /// dropped.
    async fn remove_from_all(&self, asset_id: Uuid) -> Result<u64, AppError>;

    async fn member_count(&self, album_id: Uuid) -> Result<i64, AppError>;

    /// Page through an album's assets, most recently added first.
    async fn list_members(
        &self,
        album_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError>;
}
