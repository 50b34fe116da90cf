//! Lumera Processing Library
//!
//! Pure image-processing primitives used by the variant pipeline: bounded
//! resizing, JPEG re-encoding, and the named variant presets.

pub mod presets;
pub mod resize;

// Re-export commonly used types
pub use presets::VariantSpec;
pub use resize::{
    fit_dimensions, probe_dimensions, resize_to_jpeg, ResizeError, ResizeTarget, ResizedImage,
};
