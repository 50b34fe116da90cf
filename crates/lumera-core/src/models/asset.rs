use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Media kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl MediaKind {
    /// Classify an asset from its declared content type.
    ///
    /// Classification is advisory and never fails: an absent or unrecognized
    /// content type maps to `Other`.
    pub fn from_content_type(content_type: Option<&str>) -> MediaKind {
        let Some(content_type) = content_type else {
            return MediaKind::Other;
        };
        let ct = content_type.trim().to_lowercase();
        if ct.starts_with("image/") {
            MediaKind::Image
        } else if ct.starts_with("video/") {
            MediaKind::Video
        } else if ct.starts_with("audio/") {
            MediaKind::Audio
        } else if ct == "application/pdf"
            || ct == "application/msword"
            || ct.starts_with("application/vnd.openxmlformats-officedocument")
            || ct.starts_with("text/")
        {
            MediaKind::Document
        } else {
            MediaKind::Other
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Document => write!(f, "document"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            "document" => Ok(MediaKind::Document),
            "other" => Ok(MediaKind::Other),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// Lifecycle status of an asset.
///
/// `Uploading` exists only within the ingest call; persisted assets move to
/// `Processing` immediately and settle in `Ready` or `Error`. `Error` is
/// terminal for a pipeline run; a retry re-enters `Processing` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl AssetStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetStatus::Ready | AssetStatus::Error)
    }
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStatus::Uploading => write!(f, "uploading"),
            AssetStatus::Processing => write!(f, "processing"),
            AssetStatus::Ready => write!(f, "ready"),
            AssetStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for AssetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploading" => Ok(AssetStatus::Uploading),
            "processing" => Ok(AssetStatus::Processing),
            "ready" => Ok(AssetStatus::Ready),
            "error" => Ok(AssetStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid asset status: {}", s)),
        }
    }
}

/// A stored media asset with its denormalized tag names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub media_kind: MediaKind,
    pub status: AssetStatus,
    pub storage_key: String,
    pub file_size: i64,
    // Pixel dimensions, present for images whose headers decoded; both or neither.
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub description: Option<String>,
    pub uploaded_by: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for an asset, with tags aggregated into a text array.
#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub media_kind: MediaKind,
    pub status: AssetStatus,
    pub storage_key: String,
    pub file_size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub description: Option<String>,
    pub uploaded_by: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            id: row.id,
            filename: row.filename,
            original_filename: row.original_filename,
            content_type: row.content_type,
            media_kind: row.media_kind,
            status: row.status,
            storage_key: row.storage_key,
            file_size: row.file_size,
            width: row.width,
            height: row.height,
            description: row.description,
            uploaded_by: row.uploaded_by,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Search filter for asset listings. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub media_kind: Option<MediaKind>,
    /// Assets matching ANY of these tag names (case-sensitive).
    pub tags: Option<Vec<String>>,
}
