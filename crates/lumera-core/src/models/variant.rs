use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A derived rendition of an asset (thumbnail, medium, network preset).
///
/// Variant names are unique per asset; reprocessing overwrites the record
/// and the stored bytes rather than accumulating duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Variant {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub storage_key: String,
    pub width: i32,
    pub height: i32,
    pub file_size: i64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}
