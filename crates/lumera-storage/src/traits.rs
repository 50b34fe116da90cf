//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// This allows the asset services to work with any storage backend without
/// coupling to specific implementation details.
///
/// **Key format:** Keys are generated by the `keys` module. See the crate
/// root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Verify the backing namespace (bucket or root directory) is usable.
    ///
    /// Called once at startup; a failure is fatal. Individual operations never
    /// create the namespace themselves.
    async fn ensure_namespace(&self) -> StorageResult<()>;

    /// Write an object, replacing any existing object at the same key.
    async fn put(&self, storage_key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Fetch an object's bytes by its storage key
    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Remove an object by its storage key.
    ///
    /// Deleting a key that does not exist succeeds as a no-op.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a presigned/temporary URL for direct access (GET)
    ///
    /// This is useful for giving clients temporary access to files
    /// without going through the application server
    async fn presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
