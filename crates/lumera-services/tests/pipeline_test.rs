//! Variant pipeline integration tests: failure handling, retries, and the
//! guarded status transitions around a processing run.
//!
//! Run with: `cargo test -p lumera-services --test pipeline_test`

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use helpers::{asset_record, encode_png, setup_services, upload_request, wait_for_status, MemoryIndex};
use lumera_core::models::{AssetStatus, MediaKind};
use lumera_core::AppError;
use lumera_db::{AssetIndex, VariantIndex};
use lumera_services::VariantPipeline;
use lumera_storage::{LocalStorage, Storage, StorageBackend, StorageError, StorageResult};
use tempfile::TempDir;

#[tokio::test]
async fn corrupt_image_marks_asset_error() {
    let app = setup_services().await;

    let asset = app
        .assets
        .create_asset(
            upload_request("broken.png", Some("image/png")),
            b"definitely not a png".to_vec(),
        )
        .await
        .unwrap();
    // Dimension probing already failed quietly at upload.
    assert_eq!((asset.width, asset.height), (None, None));

    let failed = wait_for_status(&app.assets, asset.id, AssetStatus::Error).await;
    assert_eq!(failed.status, AssetStatus::Error);
    assert!(app.index.list_for_asset(asset.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn retry_recovers_once_the_blob_is_fixed() {
    let app = setup_services().await;

    let asset = app
        .assets
        .create_asset(
            upload_request("flaky.png", Some("image/png")),
            b"garbage bytes".to_vec(),
        )
        .await
        .unwrap();
    wait_for_status(&app.assets, asset.id, AssetStatus::Error).await;

    // Repair the object out of band, then ask for another run.
    app.storage
        .put(&asset.storage_key, encode_png(400, 300), "image/png")
        .await
        .unwrap();
    let retried = app.assets.retry_processing(asset.id).await.unwrap();
    assert_eq!(retried.status, AssetStatus::Processing);

    wait_for_status(&app.assets, asset.id, AssetStatus::Ready).await;
    assert_eq!(app.index.list_for_asset(asset.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn retry_is_rejected_unless_asset_is_in_error() {
    let app = setup_services().await;

    let asset = app
        .assets
        .create_asset(
            upload_request("fine.png", Some("image/png")),
            encode_png(100, 100),
        )
        .await
        .unwrap();
    wait_for_status(&app.assets, asset.id, AssetStatus::Ready).await;

    let err = app.assets.retry_processing(asset.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn retry_is_rejected_for_non_image_assets() {
    let app = setup_services().await;

    let asset = app
        .assets
        .create_asset(
            upload_request("notes.txt", Some("text/plain")),
            b"plain text".to_vec(),
        )
        .await
        .unwrap();

    let err = app.assets.retry_processing(asset.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn reprocessing_overwrites_variants_in_place() {
    let app = setup_services().await;

    let asset = app
        .assets
        .create_asset(
            upload_request("stable.png", Some("image/png")),
            encode_png(900, 600),
        )
        .await
        .unwrap();
    wait_for_status(&app.assets, asset.id, AssetStatus::Ready).await;

    let first = app.index.list_for_asset(asset.id).await.unwrap();
    let first_keys: Vec<String> = first.iter().map(|v| v.storage_key.clone()).collect();

    // Variant keys derive from the original key, so a second run lands on
    // the same rows and objects.
    app.pipeline.process(asset.id).await.unwrap();

    let second = app.index.list_for_asset(asset.id).await.unwrap();
    let second_keys: Vec<String> = second.iter().map(|v| v.storage_key.clone()).collect();
    assert_eq!(first_keys, second_keys);
    assert_eq!(second.len(), 4);

    // The run could not re-mark an already settled asset.
    let after = app.assets.get_asset(asset.id).await.unwrap();
    assert_eq!(after.status, AssetStatus::Ready);
}

#[tokio::test]
async fn run_skips_asset_deleted_while_queued() {
    let app = setup_services().await;

    let record = asset_record(
        "ghost.png",
        MediaKind::Image,
        AssetStatus::Processing,
        "2026/01/01/abc_ghost.png",
    );
    app.index.insert(&record).await.unwrap();
    app.index.delete(record.id).await.unwrap();

    app.pipeline.process(record.id).await.unwrap();
    assert!(app
        .index
        .list_for_asset(record.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn run_does_not_clobber_a_settled_status() {
    let app = setup_services().await;

    let record = asset_record(
        "stale.png",
        MediaKind::Image,
        AssetStatus::Error,
        "2026/01/01/abc_stale.png",
    );
    app.storage
        .put(&record.storage_key, encode_png(300, 300), "image/png")
        .await
        .unwrap();
    app.index.insert(&record).await.unwrap();

    app.pipeline.process(record.id).await.unwrap();

    // Derivation ran, but the guarded transition refused Error -> Ready.
    assert_eq!(app.index.list_for_asset(record.id).await.unwrap().len(), 4);
    let after = AssetIndex::get(&app.index, record.id).await.unwrap().unwrap();
    assert_eq!(after.status, AssetStatus::Error);
}

#[tokio::test]
async fn missing_original_marks_asset_error() {
    let app = setup_services().await;

    let record = asset_record(
        "noblob.png",
        MediaKind::Image,
        AssetStatus::Processing,
        "2026/01/01/abc_noblob.png",
    );
    app.index.insert(&record).await.unwrap();

    app.pipeline.process(record.id).await.unwrap();

    let after = AssetIndex::get(&app.index, record.id).await.unwrap().unwrap();
    assert_eq!(after.status, AssetStatus::Error);
    assert!(app
        .index
        .list_for_asset(record.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn non_image_job_is_skipped() {
    let app = setup_services().await;

    let record = asset_record(
        "scan.pdf",
        MediaKind::Document,
        AssetStatus::Processing,
        "2026/01/01/abc_scan.pdf",
    );
    app.index.insert(&record).await.unwrap();

    app.pipeline.process(record.id).await.unwrap();

    let after = AssetIndex::get(&app.index, record.id).await.unwrap().unwrap();
    assert_eq!(after.status, AssetStatus::Processing);
    assert!(app
        .index
        .list_for_asset(record.id)
        .await
        .unwrap()
        .is_empty());
}

/// Storage wrapper that starts failing `put` after a budget of successes.
struct FailingPuts {
    inner: Arc<dyn Storage>,
    remaining: AtomicUsize,
}

#[async_trait]
impl Storage for FailingPuts {
    async fn ensure_namespace(&self) -> StorageResult<()> {
        self.inner.ensure_namespace().await
    }

    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StorageError::BackendError("injected put failure".to_string()));
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        self.inner.put(storage_key, data, content_type).await
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_url(storage_key, expires_in).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

#[tokio::test]
async fn mid_run_failure_keeps_partial_variants() {
    let temp_dir = TempDir::new().unwrap();
    let local: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), "http://localhost:8080/files".to_string())
            .await
            .unwrap(),
    );
    // One successful variant put, then failures.
    let storage: Arc<dyn Storage> = Arc::new(FailingPuts {
        inner: local.clone(),
        remaining: AtomicUsize::new(1),
    });

    let index = MemoryIndex::new();
    let assets: Arc<dyn AssetIndex> = Arc::new(index.clone());
    let variants: Arc<dyn VariantIndex> = Arc::new(index.clone());
    let pipeline = VariantPipeline::new(assets, variants, storage);

    let record = asset_record(
        "partial.png",
        MediaKind::Image,
        AssetStatus::Processing,
        "2026/01/01/abc_partial.png",
    );
    local
        .put(&record.storage_key, encode_png(500, 400), "image/png")
        .await
        .unwrap();
    index.insert(&record).await.unwrap();

    pipeline.process(record.id).await.unwrap();

    let after = AssetIndex::get(&index, record.id).await.unwrap().unwrap();
    assert_eq!(after.status, AssetStatus::Error);

    // The variant written before the failure survives in both stores.
    let kept = index.list_for_asset(record.id).await.unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].name, "thumbnail");
    assert!(local.exists(&kept[0].storage_key).await.unwrap());
}
