use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a tag came to exist on an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tag_origin", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TagOrigin {
    /// Supplied by a user at upload or via metadata update.
    Manual,
    /// Attached automatically during ingest or processing.
    Derived,
}

/// A tag attached to an asset. Names are case-sensitive and unique per asset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub origin: TagOrigin,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
