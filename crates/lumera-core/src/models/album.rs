use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named collection of assets. Membership is many-to-many and unordered.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Album {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an album.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAlbum {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}
