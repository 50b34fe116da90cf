//! Configuration module
//!
//! This module provides the application configuration, including database,
//! storage, presigning, and pipeline worker settings.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PRESIGN_TTL_MINUTES: u64 = 60;
const QUEUE_CAPACITY: usize = 256;
const PIPELINE_WORKERS: usize = 4;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    /// Lifetime of presigned download links, in whole minutes.
    pub presign_ttl_minutes: u64,
    // Variant pipeline configuration
    pub queue_capacity: usize,
    pub pipeline_workers: usize,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase().eq("production")
            || self.environment.to_lowercase().eq("prod")
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend =
            env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "s3" => Some(StorageBackend::S3),
                    "local" => Some(StorageBackend::Local),
                    _ => None,
                });

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            presign_ttl_minutes: env::var("PRESIGN_TTL_MINUTES")
                .unwrap_or_else(|_| PRESIGN_TTL_MINUTES.to_string())
                .parse()
                .unwrap_or(PRESIGN_TTL_MINUTES),
            queue_capacity: env::var("QUEUE_CAPACITY")
                .unwrap_or_else(|_| QUEUE_CAPACITY.to_string())
                .parse()
                .unwrap_or(QUEUE_CAPACITY),
            pipeline_workers: env::var("PIPELINE_WORKERS")
                .unwrap_or_else(|_| PIPELINE_WORKERS.to_string())
                .parse()
                .unwrap_or(PIPELINE_WORKERS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://") {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.presign_ttl_minutes == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGN_TTL_MINUTES must be at least 1 minute"
            ));
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
