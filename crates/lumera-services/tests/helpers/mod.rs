//! Test helpers: in-memory index implementations and a wired service stack
//! over local storage, so service behavior is tested without Postgres.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use lumera_core::models::{
    Album, Asset, AssetFilter, AssetStatus, MediaKind, NewAlbum, Page, PageRequest, Tag,
    TagOrigin, Variant,
};
use lumera_core::AppError;
use lumera_db::{AlbumIndex, AssetIndex, TagIndex, VariantIndex};
use lumera_services::{AlbumService, AssetService, VariantPipeline};
use lumera_storage::{LocalStorage, Storage};
use lumera_worker::{JobHandler, WorkQueue, WorkQueueConfig};

/// In-memory stand-in for the relational index.
///
/// One struct implements all four index traits over shared maps so that
/// composed reads (assets with their tag names, album member listings) stay
/// consistent the way the SQL joins keep them.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    assets: Arc<Mutex<HashMap<Uuid, Asset>>>,
    variants: Arc<Mutex<HashMap<(Uuid, String), Variant>>>,
    tags: Arc<Mutex<Vec<Tag>>>,
    albums: Arc<Mutex<HashMap<Uuid, Album>>>,
    // (album_id, asset_id) in insertion order; newest members list first.
    memberships: Arc<Mutex<Vec<(Uuid, Uuid)>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn tag_names(&self, asset_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.asset_id == asset_id)
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    fn compose(&self, asset: &Asset) -> Asset {
        let mut composed = asset.clone();
        composed.tags = self.tag_names(asset.id);
        composed
    }

    fn page_of<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
        let total = items.len() as i64;
        let paged: Vec<T> = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Page::new(paged, total, request)
    }
}

#[async_trait]
impl AssetIndex for MemoryIndex {
    async fn insert(&self, asset: &Asset) -> Result<(), AppError> {
        let mut stored = asset.clone();
        stored.tags = Vec::new();
        self.assets.lock().unwrap().insert(stored.id, stored);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        let asset = self.assets.lock().unwrap().get(&id).cloned();
        Ok(asset.map(|a| self.compose(&a)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.assets.lock().unwrap().remove(&id).is_some())
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool, AppError> {
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(a) if a.status == AssetStatus::Uploading => {
                a.status = AssetStatus::Processing;
                a.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_ready(&self, id: Uuid) -> Result<bool, AppError> {
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(a) if a.status == AssetStatus::Processing => {
                a.status = AssetStatus::Ready;
                a.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_error(&self, id: Uuid) -> Result<bool, AppError> {
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(a)
                if a.status == AssetStatus::Uploading || a.status == AssetStatus::Processing =>
            {
                a.status = AssetStatus::Error;
                a.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn resume_processing(&self, id: Uuid) -> Result<bool, AppError> {
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(a) if a.status == AssetStatus::Error => {
                a.status = AssetStatus::Processing;
                a.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_description(&self, id: Uuid, description: &str) -> Result<bool, AppError> {
        let mut assets = self.assets.lock().unwrap();
        match assets.get_mut(&id) {
            Some(a) => {
                a.description = Some(description.to_string());
                a.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search(
        &self,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        let assets: Vec<Asset> = self
            .assets
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        let mut matches: Vec<Asset> = assets
            .iter()
            .map(|a| self.compose(a))
            .filter(|a| {
                if let Some(kind) = filter.media_kind {
                    if a.media_kind != kind {
                        return false;
                    }
                }
                if let Some(tags) = filter.tags.as_ref() {
                    if !tags.iter().any(|t| a.tags.contains(t)) {
                        return false;
                    }
                }
                true
            })
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Self::page_of(matches, page))
    }
}

#[async_trait]
impl VariantIndex for MemoryIndex {
    async fn upsert(&self, variant: &Variant) -> Result<(), AppError> {
        self.variants
            .lock()
            .unwrap()
            .insert((variant.asset_id, variant.name.clone()), variant.clone());
        Ok(())
    }

    async fn get(&self, asset_id: Uuid, name: &str) -> Result<Option<Variant>, AppError> {
        Ok(self
            .variants
            .lock()
            .unwrap()
            .get(&(asset_id, name.to_string()))
            .cloned())
    }

    async fn list_for_asset(&self, asset_id: Uuid) -> Result<Vec<Variant>, AppError> {
        let mut variants: Vec<Variant> = self
            .variants
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.asset_id == asset_id)
            .cloned()
            .collect();
        variants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(variants)
    }

    async fn delete_for_asset(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let mut variants = self.variants.lock().unwrap();
        let before = variants.len();
        variants.retain(|(owner, _), _| *owner != asset_id);
        Ok((before - variants.len()) as u64)
    }
}

#[async_trait]
impl TagIndex for MemoryIndex {
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
        let mut tags = self.tags.lock().unwrap();
        let mut added = 0;
        for name in names {
            let exists = tags
                .iter()
                .any(|t| t.asset_id == asset_id && t.name == *name);
            if !exists {
                tags.push(Tag {
                    id: Uuid::new_v4(),
                    asset_id,
                    name: name.clone(),
                    origin,
                    created_by: created_by.map(|s| s.to_string()),
                    created_at: Utc::now(),
                });
                added += 1;
            }
        }
        Ok(added)
    }

    async fn remove(&self, asset_id: Uuid, names: &[String]) -> Result<u64, AppError> {
        if names.is_empty() {
            return Ok(0);
        }
        let mut tags = self.tags.lock().unwrap();
        let before = tags.len();
        tags.retain(|t| !(t.asset_id == asset_id && names.contains(&t.name)));
        Ok((before - tags.len()) as u64)
    }

    async fn list_names(&self, asset_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(self.tag_names(asset_id))
    }

    async fn delete_all(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let mut tags = self.tags.lock().unwrap();
        let before = tags.len();
        tags.retain(|t| t.asset_id != asset_id);
        Ok((before - tags.len()) as u64)
    }
}

#[async_trait]
impl AlbumIndex for MemoryIndex {
    async fn create(&self, album: &NewAlbum) -> Result<Album, AppError> {
        let now = Utc::now();
        let created = Album {
            id: Uuid::new_v4(),
            name: album.name.clone(),
            description: album.description.clone(),
            created_by: album.created_by.clone(),
            is_public: album.is_public,
            created_at: now,
            updated_at: now,
        };
        self.albums
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Album>, AppError> {
        Ok(self.albums.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Album>, AppError> {
        let mut albums: Vec<Album> = self.albums.lock().unwrap().values().cloned().collect();
        albums.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(Self::page_of(albums, page))
    }

    async fn add_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError> {
        let mut memberships = self.memberships.lock().unwrap();
        if memberships.contains(&(album_id, asset_id)) {
            return Ok(false);
        }
        memberships.push((album_id, asset_id));
        Ok(true)
    }

    async fn remove_member(&self, album_id: Uuid, asset_id: Uuid) -> Result<bool, AppError> {
        let mut memberships = self.memberships.lock().unwrap();
        let before = memberships.len();
        memberships.retain(|m| *m != (album_id, asset_id));
        Ok(memberships.len() < before)
    }

    async fn remove_from_all(&self, asset_id: Uuid) -> Result<u64, AppError> {
        let mut memberships = self.memberships.lock().unwrap();
        let before = memberships.len();
        memberships.retain(|(_, member)| *member != asset_id);
        Ok((before - memberships.len()) as u64)
    }

    async fn member_count(&self, album_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .filter(|(album, _)| *album == album_id)
            .count() as i64)
    }

    async fn list_members(
        &self,
        album_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Asset>, AppError> {
        let member_ids: Vec<Uuid> = self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .filter(|(album, _)| *album == album_id)
            .map(|(_, asset)| *asset)
            .rev()
            .collect();
        let assets = self.assets.lock().unwrap();
        let members: Vec<Asset> = member_ids
            .iter()
            .filter_map(|id| assets.get(id))
            .map(|a| self.compose(a))
            .collect();
        Ok(Self::page_of(members, page))
    }
}

/// Wired service stack over in-memory indexes and a tempdir-backed store.
pub struct TestHarness {
    pub assets: AssetService,
    pub albums: AlbumService,
    pub queue: WorkQueue,
    pub pipeline: Arc<VariantPipeline>,
    pub index: MemoryIndex,
    pub storage: Arc<dyn Storage>,
    pub _temp_dir: TempDir,
}

pub async fn setup_services() -> TestHarness {
    let temp_dir = TempDir::new().expect("create temp dir");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            temp_dir.path(),
            "http://localhost:8080/files".to_string(),
        )
        .await
        .expect("create local storage"),
    );

    let index = MemoryIndex::new();
    let asset_index: Arc<dyn AssetIndex> = Arc::new(index.clone());
    let variant_index: Arc<dyn VariantIndex> = Arc::new(index.clone());
    let tag_index: Arc<dyn TagIndex> = Arc::new(index.clone());
    let album_index: Arc<dyn AlbumIndex> = Arc::new(index.clone());

    let pipeline = Arc::new(VariantPipeline::new(
        asset_index.clone(),
        variant_index.clone(),
        storage.clone(),
    ));
    let handler: Arc<dyn JobHandler> = pipeline.clone();
    let queue = WorkQueue::start(WorkQueueConfig::default(), Arc::downgrade(&handler));

    let assets = AssetService::new(
        asset_index.clone(),
        variant_index,
        tag_index,
        album_index.clone(),
        storage.clone(),
        queue.clone(),
        60,
    );
    let albums = AlbumService::new(album_index, asset_index);

    TestHarness {
        assets,
        albums,
        queue,
        pipeline,
        index,
        storage,
        _temp_dir: temp_dir,
    }
}

/// Encode a solid-color PNG of the given size.
pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([80, 120, 200, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Poll until the asset reaches the expected status or five seconds pass.
pub async fn wait_for_status(assets: &AssetService, id: Uuid, expected: AssetStatus) -> Asset {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let asset = assets.get_asset(id).await.expect("asset exists");
        if asset.status == expected {
            return asset;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "asset {} did not reach {:?} in time, last status was {:?}",
            id,
            expected,
            asset.status
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Upload request with sensible defaults for tests.
pub fn upload_request(filename: &str, content_type: Option<&str>) -> lumera_services::UploadRequest {
    lumera_services::UploadRequest {
        filename: filename.to_string(),
        content_type: content_type.map(|s| s.to_string()),
        uploaded_by: Some("tester".to_string()),
        description: None,
        tags: Vec::new(),
    }
}

/// Bare asset record for seeding the index directly.
pub fn asset_record(
    filename: &str,
    media_kind: MediaKind,
    status: AssetStatus,
    storage_key: &str,
) -> Asset {
    let now = Utc::now();
    Asset {
        id: Uuid::new_v4(),
        filename: filename.to_string(),
        original_filename: filename.to_string(),
        content_type: Some("image/png".to_string()),
        media_kind,
        status,
        storage_key: storage_key.to_string(),
        file_size: 0,
        width: None,
        height: None,
        description: None,
        uploaded_by: None,
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
