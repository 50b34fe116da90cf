//! Asset lifecycle orchestration
//!
//! `AssetService` coordinates the storage backend, the relational index, and
//! the background queue for the full life of an asset: ingest, retrieval,
//! metadata updates, reprocessing, and cascading deletion.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lumera_core::models::{
    Asset, AssetFilter, AssetStatus, MediaKind, Page, PageRequest, TagOrigin,
};
use lumera_core::AppError;
use lumera_db::{AlbumIndex, AssetIndex, TagIndex, VariantIndex};
use lumera_processing::probe_dimensions;
use lumera_storage::keys::{generate_storage_key, sanitize_filename};
use lumera_storage::{Storage, StorageError};
use lumera_worker::WorkQueue;

/// Fields accepted alongside the raw bytes when ingesting an asset.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: Option<String>,
    pub uploaded_by: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Raw object bytes plus the headers a download response needs.
#[derive(Debug, Clone)]
pub struct AssetContent {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: String,
}

/// Presigned URL for one variant.
#[derive(Debug, Clone, Serialize)]
pub struct VariantLink {
    pub name: String,
    pub url: String,
    pub width: i32,
    pub height: i32,
}

/// An asset with temporary direct-access URLs for it and its variants.
#[derive(Debug, Clone, Serialize)]
pub struct AssetLinks {
    pub asset: Asset,
    pub original_url: String,
    pub variants: Vec<VariantLink>,
    pub expires_in_minutes: u64,
}

/// Partial metadata update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataUpdate {
    pub description: Option<String>,
    #[serde(default)]
    pub add_tags: Vec<String>,
    #[serde(default)]
    pub remove_tags: Vec<String>,
}

fn map_storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(key) => {
            AppError::NotFound(format!("Object {} not found in storage", key))
        }
        other => AppError::StoreUnavailable(other.to_string()),
    }
}

/// Orchestrates asset ingest, retrieval, and deletion.
#[derive(Clone)]
pub struct AssetService {
    assets: Arc<dyn AssetIndex>,
    variants: Arc<dyn VariantIndex>,
    tags: Arc<dyn TagIndex>,
    albums: Arc<dyn AlbumIndex>,
    storage: Arc<dyn Storage>,
    queue: WorkQueue,
    presign_ttl_minutes: u64,
}

impl AssetService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        assets: Arc<dyn AssetIndex>,
        variants: Arc<dyn VariantIndex>,
        tags: Arc<dyn TagIndex>,
        albums: Arc<dyn AlbumIndex>,
        storage: Arc<dyn Storage>,
        queue: WorkQueue,
        presign_ttl_minutes: u64,
    ) -> Self {
        Self {
            assets,
            variants,
            tags,
            albums,
            storage,
            queue,
            presign_ttl_minutes,
        }
    }

    /// Ingest a new asset: store the original, index it, and hand image
    /// assets to the processing queue.
    ///
    /// Returns the persisted asset, normally in `Processing`. A failed queue
    /// handoff marks the asset `Error` instead of failing the upload; only
    /// image assets are ever enqueued, so other kinds stay `Processing`.
    #[tracing::instrument(
        skip(self, request, data),
        fields(filename = %request.filename, size = data.len())
    )]
    pub async fn create_asset(
        &self,
        request: UploadRequest,
        data: Vec<u8>,
    ) -> Result<Asset, AppError> {
        if request.filename.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Filename must not be empty".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput(
                "Uploaded file is empty".to_string(),
            ));
        }

        let storage_key = generate_storage_key(&request.filename);
        // Same normalization the key generator applies, so the record and the
        // key's final component agree.
        let filename = sanitize_filename(&request.filename);
        let media_kind = MediaKind::from_content_type(request.content_type.as_deref());

        let (width, height) = if media_kind == MediaKind::Image {
            match probe_dimensions(&data) {
                Some((w, h)) => (Some(w as i32), Some(h as i32)),
                None => {
                    tracing::warn!(
                        filename = %filename,
                        "Could not read image dimensions from upload"
                    );
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        let file_size = data.len() as i64;
        let content_type = request
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.storage
            .put(&storage_key, data, &content_type)
            .await
            .map_err(map_storage_error)?;

        let now = Utc::now();
        let mut asset = Asset {
            id: Uuid::new_v4(),
            filename,
            original_filename: request.filename.clone(),
            content_type: request.content_type.clone(),
            media_kind,
            status: AssetStatus::Uploading,
            storage_key,
            file_size,
            width,
            height,
            description: request.description.clone(),
            uploaded_by: request.uploaded_by.clone(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.assets.insert(&asset).await?;

        if self.assets.mark_processing(asset.id).await? {
            asset.status = AssetStatus::Processing;
        }

        if !request.tags.is_empty() {
            self.tags
                .add(
                    asset.id,
                    &request.tags,
                    TagOrigin::Manual,
                    request.uploaded_by.as_deref(),
                )
                .await?;
            asset.tags = self.tags.list_names(asset.id).await?;
        }

        if media_kind == MediaKind::Image {
            if let Err(e) = self.queue.enqueue(asset.id).await {
                tracing::error!(
                    error = %e,
                    asset_id = %asset.id,
                    "Failed to enqueue processing job, marking asset as failed"
                );
                if self.assets.mark_error(asset.id).await? {
                    asset.status = AssetStatus::Error;
                }
            }
        }

        tracing::info!(
            asset_id = %asset.id,
            media_kind = %asset.media_kind,
            status = %asset.status,
            "Asset created"
        );
        Ok(asset)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_asset(&self, id: Uuid) -> Result<Asset, AppError> {
        self.assets
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    /// Fetch the original bytes for download.
    #[tracing::instrument(skip(self))]
    pub async fn get_content(&self, id: Uuid) -> Result<AssetContent, AppError> {
        let asset = self.get_asset(id).await?;
        let data = self
            .storage
            .get(&asset.storage_key)
            .await
            .map_err(map_storage_error)?;
        Ok(AssetContent {
            data,
            content_type: asset.content_type,
            filename: asset.filename,
        })
    }

    /// Fetch the bytes of one named variant.
    #[tracing::instrument(skip(self))]
    pub async fn get_variant_content(
        &self,
        id: Uuid,
        variant_name: &str,
    ) -> Result<AssetContent, AppError> {
        let asset = self.get_asset(id).await?;
        let variant = self.variants.get(id, variant_name).await?.ok_or_else(|| {
            AppError::NotFound(format!("Variant {} of asset {} not found", variant_name, id))
        })?;
        let data = self
            .storage
            .get(&variant.storage_key)
            .await
            .map_err(map_storage_error)?;
        Ok(AssetContent {
            data,
            content_type: Some(variant.content_type),
            filename: format!("{}_{}", variant.name, asset.filename),
        })
    }

    /// Presign direct-access URLs for the original and every variant.
    ///
    /// The TTL is whole minutes; callers that do not pass one get the
    /// configured default.
    #[tracing::instrument(skip(self))]
    pub async fn get_asset_links(
        &self,
        id: Uuid,
        ttl_minutes: Option<u64>,
    ) -> Result<AssetLinks, AppError> {
        let asset = self.get_asset(id).await?;
        let minutes = ttl_minutes.unwrap_or(self.presign_ttl_minutes).max(1);
        let expires_in = Duration::from_secs(minutes * 60);

        let original_url = self
            .storage
            .presigned_url(&asset.storage_key, expires_in)
            .await
            .map_err(map_storage_error)?;

        let mut variants = Vec::new();
        for variant in self.variants.list_for_asset(id).await? {
            let url = self
                .storage
                .presigned_url(&variant.storage_key, expires_in)
                .await
                .map_err(map_storage_error)?;
            variants.push(VariantLink {
                name: variant.name,
                url,
                width: variant.width,
                height: variant.height,
            });
        }

        Ok(AssetLinks {
            asset,
            original_url,
            variants,
            expires_in_minutes: minutes,
        })
    }

    /// Delete an asset and everything hanging off it.
    ///
    /// Storage and secondary-record deletions are best effort: a failure is
    /// logged and the cascade continues, leaving at worst orphaned blobs.
    /// Only a failure to delete the asset record itself surfaces.
    #[tracing::instrument(skip(self))]
    pub async fn delete_asset(&self, id: Uuid) -> Result<(), AppError> {
        let asset = self.get_asset(id).await?;
        let variants = self.variants.list_for_asset(id).await?;

        if let Err(e) = self.storage.delete(&asset.storage_key).await {
            tracing::error!(
                error = %e,
                storage_key = %asset.storage_key,
                "Failed to delete original from storage, continuing with cascade"
            );
        }
        for variant in &variants {
            if let Err(e) = self.storage.delete(&variant.storage_key).await {
                tracing::error!(
                    error = %e,
                    storage_key = %variant.storage_key,
                    "Failed to delete variant from storage, continuing with cascade"
                );
            }
        }
        if let Err(e) = self.variants.delete_for_asset(id).await {
            tracing::error!(
                error = %e,
                asset_id = %id,
                "Failed to delete variant records, continuing with cascade"
            );
        }
        if let Err(e) = self.tags.delete_all(id).await {
            tracing::error!(
                error = %e,
                asset_id = %id,
                "Failed to delete tag records, continuing with cascade"
            );
        }
        if let Err(e) = self.albums.remove_from_all(id).await {
            tracing::error!(
                error = %e,
                asset_id = %id,
                "Failed to remove album memberships, continuing with cascade"
            );
        }

        if !self.assets.delete(id).await? {
            // Lost a race with a concurrent delete; the steps above are idempotent.
            tracing::warn!(asset_id = %id, "Asset record was already deleted");
        }
        tracing::info!(asset_id = %id, variant_count = variants.len(), "Asset deleted");
        Ok(())
    }

    /// Re-run the variant pipeline for an asset stuck in `Error`.
    ///
    /// The guarded Error to Processing transition doubles as the lock: an
    /// asset with a run already in flight is not in `Error` and is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn retry_processing(&self, id: Uuid) -> Result<Asset, AppError> {
        let asset = self.get_asset(id).await?;
        if asset.media_kind != MediaKind::Image {
            return Err(AppError::InvalidInput(format!(
                "Asset {} is not an image and has no processing pipeline",
                id
            )));
        }
        if !self.assets.resume_processing(id).await? {
            return Err(AppError::InvalidInput(format!(
                "Asset {} is not in the error state",
                id
            )));
        }
        if let Err(e) = self.queue.enqueue(id).await {
            tracing::error!(error = %e, asset_id = %id, "Failed to enqueue retry job");
            self.assets.mark_error(id).await?;
            return Err(AppError::Pipeline(format!(
                "Could not queue processing for asset {}",
                id
            )));
        }
        tracing::info!(asset_id = %id, "Asset re-queued for processing");
        self.get_asset(id).await
    }

    /// Apply a partial metadata update and return the refreshed asset.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_metadata(
        &self,
        id: Uuid,
        update: MetadataUpdate,
    ) -> Result<Asset, AppError> {
        // Existence check up front so tag calls never create orphan records.
        self.get_asset(id).await?;

        if let Some(description) = update.description.as_deref() {
            self.assets.update_description(id, description).await?;
        }
        if !update.add_tags.is_empty() {
            self.tags
                .add(id, &update.add_tags, TagOrigin::Manual, None)
                .await?;
        }
        if !update.remove_tags.is_empty() {
            self.tags.remove(id, &update.remove_tags).await?;
        }

        self.get_asset(id).await
    }

    #[tracing::instrument(skip(self, filter, page))]
    pub async fn search_assets(
        &self,
        filter: AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        self.assets.search(&filter, page).await
    }
}
