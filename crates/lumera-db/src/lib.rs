//! Lumera database layer
//!
//! This crate provides the Postgres repositories for assets, variants, tags,
//! and albums, the pool/migration setup, and the index traits the service
//! layer consumes.

pub mod db;
pub mod pool;
pub mod traits;

pub use db::{AlbumRepository, AssetRepository, TagRepository, VariantRepository};
pub use pool::{connect_pool, run_migrations};
pub use traits::{AlbumIndex, AssetIndex, TagIndex, VariantIndex};
