//! Variant derivation pipeline
//!
//! Runs on the worker pool: fetches the original image, derives each variant
//! in the default set, and settles the asset in `Ready` or `Error`. Variant
//! keys are deterministic, so a retry overwrites earlier renditions instead
//! of accumulating copies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use lumera_core::models::{Asset, MediaKind, Variant};
use lumera_core::AppError;
use lumera_db::{AssetIndex, VariantIndex};
use lumera_processing::{resize_to_jpeg, ResizeError, VariantSpec};
use lumera_storage::keys::variant_storage_key;
use lumera_storage::Storage;
use lumera_worker::{Job, JobHandler};

// All variants are re-encoded as JPEG regardless of the source format.
const VARIANT_CONTENT_TYPE: &str = "image/jpeg";

/// Background handler that derives the default variant set for an asset.
pub struct VariantPipeline {
    assets: Arc<dyn AssetIndex>,
    variants: Arc<dyn VariantIndex>,
    storage: Arc<dyn Storage>,
}

impl VariantPipeline {
    pub fn new(
        assets: Arc<dyn AssetIndex>,
        variants: Arc<dyn VariantIndex>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            assets,
            variants,
            storage,
        }
    }

    /// Process one asset end to end.
    ///
    /// Job-level oddities (asset deleted while queued, non-image kind) are
    /// logged and swallowed; processing failures mark the asset `Error` and
    /// keep whatever variants were already written. Both status transitions
    /// are guarded, so a deletion that lands mid-run wins over this run's
    /// outcome.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, asset_id: Uuid) -> Result<(), AppError> {
        let Some(asset) = self.assets.get(asset_id).await? else {
            tracing::warn!(asset_id = %asset_id, "Asset vanished before processing, skipping job");
            return Ok(());
        };
        if asset.media_kind != MediaKind::Image {
            tracing::warn!(
                asset_id = %asset_id,
                media_kind = %asset.media_kind,
                "Processing job for non-image asset, skipping"
            );
            return Ok(());
        }

        let original = match self.storage.get(&asset.storage_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    asset_id = %asset_id,
                    storage_key = %asset.storage_key,
                    "Could not fetch original for processing"
                );
                self.fail(asset_id).await?;
                return Ok(());
            }
        };

        for spec in VariantSpec::default_set() {
            match self.derive_variant(&asset, &original, &spec).await {
                Ok(variant) => {
                    tracing::debug!(
                        asset_id = %asset_id,
                        variant = %variant.name,
                        width = variant.width,
                        height = variant.height,
                        "Variant stored"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        asset_id = %asset_id,
                        variant = %spec.name,
                        "Variant derivation failed"
                    );
                    // Variants written before the failure stay available.
                    self.fail(asset_id).await?;
                    return Ok(());
                }
            }
        }

        if self.assets.mark_ready(asset_id).await? {
            tracing::info!(asset_id = %asset_id, "Asset processed");
        } else {
            tracing::warn!(
                asset_id = %asset_id,
                "Asset left processing state mid-run, not marking ready"
            );
        }
        Ok(())
    }

    /// Resize, store, and index a single variant.
    async fn derive_variant(
        &self,
        asset: &Asset,
        original: &[u8],
        spec: &VariantSpec,
    ) -> Result<Variant, AppError> {
        let resized = resize_to_jpeg(original, spec.resize_target()).map_err(|e| match e {
            ResizeError::Decode(msg) | ResizeError::InvalidDimensions(msg) => {
                AppError::InvalidInput(msg)
            }
            ResizeError::Encode(msg) => AppError::Pipeline(msg),
        })?;

        let storage_key = variant_storage_key(&asset.storage_key, &spec.name);
        self.storage
            .put(&storage_key, resized.data.to_vec(), VARIANT_CONTENT_TYPE)
            .await
            .map_err(|e| AppError::StoreUnavailable(e.to_string()))?;

        let variant = Variant {
            id: Uuid::new_v4(),
            asset_id: asset.id,
            name: spec.name.clone(),
            storage_key,
            width: resized.width as i32,
            height: resized.height as i32,
            file_size: resized.data.len() as i64,
            content_type: VARIANT_CONTENT_TYPE.to_string(),
            created_at: Utc::now(),
        };
        self.variants.upsert(&variant).await?;
        Ok(variant)
    }

    async fn fail(&self, asset_id: Uuid) -> Result<(), AppError> {
        if !self.assets.mark_error(asset_id).await? {
            tracing::warn!(
                asset_id = %asset_id,
                "Asset left processing state mid-run, could not mark as failed"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl JobHandler for VariantPipeline {
    async fn run(self: Arc<Self>, job: Job) -> anyhow::Result<()> {
        self.process(job.asset_id).await?;
        Ok(())
    }
}
