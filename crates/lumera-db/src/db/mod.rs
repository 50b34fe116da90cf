//! Postgres repositories for the media data plane
//!
//! Each repository owns the queries for one table family and implements the
//! matching index trait from [`crate::traits`].

pub mod albums;
pub mod assets;
pub mod tags;
pub mod variants;

pub use albums::AlbumRepository;
pub use assets::AssetRepository;
pub use tags::TagRepository;
pub use variants::VariantRepository;
