//! Lumera Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! telemetry setup shared across all Lumera components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
