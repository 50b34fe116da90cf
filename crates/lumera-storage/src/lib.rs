//! Lumera Storage Library
//!
//! This crate provides storage abstraction and implementations for Lumera.
//! It includes the Storage trait and implementations for S3 and local filesystem.
//!
//! # Storage key format
//!
//! Originals are keyed by upload date and a fresh UUID:
//!
//! - **Original**: `{yyyy}/{mm}/{dd}/{uuid}_{filename}`
//! - **Variant**: `{yyyy}/{mm}/{dd}/variants/{variant}/{uuid}_{filename}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use lumera_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
