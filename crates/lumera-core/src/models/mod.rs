//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific feature area.

mod album;
mod asset;
mod page;
mod tag;
mod variant;

// Re-export all models for convenient imports
pub use album::*;
pub use asset::*;
pub use page::*;
pub use tag::*;
pub use variant::*;
