//! Named variant presets.
//!
//! Every image asset gets the default set; network presets are sized to the
//! platform's preferred display dimensions.

use crate::resize::ResizeTarget;

/// A named rendition and its bounding box. A zero bound leaves that axis
/// unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        VariantSpec {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn thumbnail() -> Self {
        Self::new("thumbnail", 150, 150)
    }

    pub fn medium() -> Self {
        Self::new("medium", 600, 600)
    }

    /// Preset for a social network.
    ///
    /// Unrecognized names keep the requested name and fall back to generic
    /// link-preview bounds, so a pipeline run never fails on an unknown
    /// network.
    pub fn for_network(name: &str) -> Self {
        match name {
            "instagram" => Self::new("instagram", 1080, 1080),
            "vk" => Self::new("vk", 1280, 720),
            "telegram" => Self::new("telegram", 1280, 0),
            other => Self::new(other, 1200, 630),
        }
    }

    /// The renditions produced for every image asset.
    pub fn default_set() -> Vec<VariantSpec> {
        vec![
            Self::thumbnail(),
            Self::medium(),
            Self::for_network("instagram"),
            Self::for_network("telegram"),
        ]
    }

    pub fn resize_target(&self) -> ResizeTarget {
        ResizeTarget::bounded(self.width, self.height)
    }
}
