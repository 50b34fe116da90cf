//! Lumera service layer
//!
//! Business services over the storage backend, the relational index, and the
//! worker pool, plus the composition root that wires them together. Callers
//! (HTTP handlers, CLI tooling) depend on this facade instead of on the
//! individual infrastructure crates.

use std::sync::Arc;

use anyhow::Context;

use lumera_core::Config;
use lumera_db::{
    AlbumIndex, AlbumRepository, AssetIndex, AssetRepository, TagIndex, TagRepository,
    VariantIndex, VariantRepository,
};
use lumera_worker::{JobHandler, WorkQueue, WorkQueueConfig};

pub mod albums;
pub mod assets;
pub mod pipeline;

pub use albums::AlbumService;
pub use assets::{
    AssetContent, AssetLinks, AssetService, MetadataUpdate, UploadRequest, VariantLink,
};
pub use pipeline::VariantPipeline;

// Re-export the storage facade so callers need a single service-layer import.
pub use lumera_storage::{create_storage, Storage, StorageBackend, StorageError, StorageResult};

/// Fully wired application services.
///
/// `pipeline` owns the job handler; the queue holds it only weakly, so this
/// struct must outlive the queue for jobs to keep running.
#[derive(Clone)]
pub struct AppServices {
    pub assets: AssetService,
    pub albums: AlbumService,
    pub queue: WorkQueue,
    pub pipeline: Arc<VariantPipeline>,
}

impl AppServices {
    /// Verify storage, connect and migrate the database, and wire every
    /// service. Any failure here is fatal to startup.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let storage = create_storage(config)
            .await
            .context("Failed to initialize storage backend")?;
        storage
            .ensure_namespace()
            .await
            .context("Storage namespace verification failed")?;

        let pool = lumera_db::connect_pool(config).await?;
        lumera_db::run_migrations(&pool).await?;

        let assets: Arc<dyn AssetIndex> = Arc::new(AssetRepository::new(pool.clone()));
        let variants: Arc<dyn VariantIndex> = Arc::new(VariantRepository::new(pool.clone()));
        let tags: Arc<dyn TagIndex> = Arc::new(TagRepository::new(pool.clone()));
        let albums: Arc<dyn AlbumIndex> = Arc::new(AlbumRepository::new(pool));

        let pipeline = Arc::new(VariantPipeline::new(
            assets.clone(),
            variants.clone(),
            storage.clone(),
        ));
        let handler: Arc<dyn JobHandler> = pipeline.clone();
        let queue = WorkQueue::start(
            WorkQueueConfig {
                capacity: config.queue_capacity,
                max_workers: config.pipeline_workers,
            },
            Arc::downgrade(&handler),
        );

        let asset_service = AssetService::new(
            assets.clone(),
            variants,
            tags,
            albums.clone(),
            storage,
            queue.clone(),
            config.presign_ttl_minutes,
        );
        let album_service = AlbumService::new(albums, assets);

        Ok(AppServices {
            assets: asset_service,
            albums: album_service,
            queue,
            pipeline,
        })
    }

    /// Stop accepting new jobs; in-flight work is left to drain.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}
