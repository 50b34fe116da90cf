use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageReader};
use thiserror::Error;

/// JPEG quality used for all derived variants.
const JPEG_QUALITY: u8 = 85;

/// Resize operation errors
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid resize dimensions: {0}")]
    InvalidDimensions(String),
}

/// Bounding-box resize target. `None` leaves that axis unconstrained.
#[derive(Debug, Clone, Copy)]
pub struct ResizeTarget {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeTarget {
    /// Build a target from raw bounds where zero means "unconstrained".
    pub fn bounded(width: u32, height: u32) -> Self {
        ResizeTarget {
            width: (width > 0).then_some(width),
            height: (height > 0).then_some(height),
        }
    }
}

/// A re-encoded rendition with its final pixel dimensions.
#[derive(Debug, Clone)]
pub struct ResizedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Calculate output dimensions for a source image and a target.
///
/// With both bounds set, the image is scaled by the smaller of the two axis
/// ratios so the result fits inside the box; neither bound is ever exceeded
/// and aspect ratio is preserved up to integer rounding. With one bound, the
/// other axis follows the aspect ratio. With neither bound, the target is
/// invalid.
pub fn fit_dimensions(
    orig_width: u32,
    orig_height: u32,
    target: ResizeTarget,
) -> Result<(u32, u32), ResizeError> {
    if orig_width == 0 || orig_height == 0 {
        return Err(ResizeError::InvalidDimensions(
            "source image has a zero dimension".to_string(),
        ));
    }

    match (target.width, target.height) {
        (None, None) => Err(ResizeError::InvalidDimensions(
            "at least one target dimension must be specified".to_string(),
        )),
        (Some(w), None) => {
            let aspect_ratio = orig_height as f64 / orig_width as f64;
            let h = (w as f64 * aspect_ratio).round() as u32;
            Ok((w.max(1), h.max(1)))
        }
        (None, Some(h)) => {
            let aspect_ratio = orig_width as f64 / orig_height as f64;
            let w = (h as f64 * aspect_ratio).round() as u32;
            Ok((w.max(1), h.max(1)))
        }
        (Some(w), Some(h)) => {
            let width_ratio = w as f64 / orig_width as f64;
            let height_ratio = h as f64 / orig_height as f64;
            let scale = width_ratio.min(height_ratio);
            let out_w = (orig_width as f64 * scale).round() as u32;
            let out_h = (orig_height as f64 * scale).round() as u32;
            Ok((out_w.clamp(1, w), out_h.clamp(1, h)))
        }
    }
}

/// Select appropriate filter type based on resize ratio
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

/// Decode, resize into the target box, and re-encode as JPEG.
///
/// Any decodable raster format is accepted; output is always JPEG at a fixed
/// quality. Undecodable input is a `Decode` error, never a panic.
pub fn resize_to_jpeg(data: &[u8], target: ResizeTarget) -> Result<ResizedImage, ResizeError> {
    let cursor = Cursor::new(data);
    let reader = ImageReader::new(cursor)
        .with_guessed_format()
        .map_err(|e| ResizeError::Decode(e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| ResizeError::Decode(e.to_string()))?;

    let (orig_width, orig_height) = img.dimensions();
    let (width, height) = fit_dimensions(orig_width, orig_height, target)?;

    let filter = select_filter(orig_width, orig_height, width, height);
    let resized = img.resize_exact(width, height, filter);

    // JPEG carries no alpha channel.
    let rgb = resized.to_rgb8();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ResizeError::Encode(e.to_string()))?;

    tracing::debug!(
        orig_width,
        orig_height,
        width,
        height,
        size_bytes = buffer.len(),
        "Resized image"
    );

    Ok(ResizedImage {
        data: Bytes::from(buffer),
        width,
        height,
    })
}

/// Best-effort dimension probe from encoded image bytes.
///
/// Returns `None` when the bytes are not a decodable image; callers treat
/// dimensions as advisory metadata.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let cursor = Cursor::new(data);
    let reader = ImageReader::new(cursor).with_guessed_format().ok()?;
    reader.into_dimensions().ok()
}
