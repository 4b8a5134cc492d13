//! Image comparison and tolerance checks.
//!
//! The difference metric is expressed in parts per million of the compared
//! pixels: every pixel contributes its largest channel difference scaled to
//! `0.0..=1.0`, the sum is divided by the pixel count and multiplied by
//! [`DIFF_SCALE`]. Identical images score `0`, completely inverted images
//! score `DIFF_SCALE`, and images of different sizes score `DIFF_SCALE`.

use image::{DynamicImage, RgbaImage};
use serde::Serialize;

use super::types::{SnapshotError, SnapshotResult};

/// Upper bound of the difference metric
pub const DIFF_SCALE: f64 = 1_000_000.0;

/// Outcome of comparing two images
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiff {
    /// Difference metric, `0.0..=DIFF_SCALE`
    pub diff: f64,
    /// Number of pixels with any channel difference
    pub differing_pixels: u64,
    /// Number of pixels compared
    pub total_pixels: u64,
    /// Largest single channel difference seen
    pub max_channel_diff: u8,
}

impl ImageDiff {
    /// Whether the images are pixel-identical
    pub fn is_identical(&self) -> bool {
        self.differing_pixels == 0 && self.diff == 0.0
    }

    /// `diff <= tolerance`
    pub fn within_tolerance(&self, tolerance: f64) -> bool {
        self.diff <= tolerance
    }
}

fn ensure_encodable(image: &RgbaImage, which: &str) -> SnapshotResult<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SnapshotError::EncodingFailure(format!(
            "{} image has no pixels ({}x{})",
            which,
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Compute the difference metric between two images.
///
/// Fails with `EncodingFailure` when either image has no pixels.
pub fn diff_images(actual: &RgbaImage, reference: &RgbaImage) -> SnapshotResult<ImageDiff> {
    ensure_encodable(actual, "actual")?;
    ensure_encodable(reference, "reference")?;

    if actual.dimensions() != reference.dimensions() {
        let total = u64::from(actual.width()) * u64::from(actual.height());
        return Ok(ImageDiff {
            diff: DIFF_SCALE,
            differing_pixels: total,
            total_pixels: total,
            max_channel_diff: u8::MAX,
        });
    }

    let mut differing_pixels = 0u64;
    let mut max_channel_diff = 0u8;
    let mut weight = 0u64;

    for (a, b) in actual.pixels().zip(reference.pixels()) {
        let pixel_diff = a
            .0
            .iter()
            .zip(b.0.iter())
            .map(|(x, y)| x.abs_diff(*y))
            .max()
            .unwrap_or(0);
        if pixel_diff > 0 {
            differing_pixels += 1;
            weight += u64::from(pixel_diff);
            max_channel_diff = max_channel_diff.max(pixel_diff);
        }
    }

    let total_pixels = u64::from(actual.width()) * u64::from(actual.height());
    let diff = weight as f64 * DIFF_SCALE / (total_pixels as f64 * f64::from(u8::MAX));

    Ok(ImageDiff {
        diff,
        differing_pixels,
        total_pixels,
        max_channel_diff,
    })
}

/// Compare two images and enforce `diff <= tolerance`.
///
/// Returns the diff on success, `MismatchExceedsTolerance` otherwise.
pub fn compare(actual: &RgbaImage, reference: &RgbaImage, tolerance: f64) -> SnapshotResult<f64> {
    let result = diff_images(actual, reference)?;
    if result.within_tolerance(tolerance) {
        Ok(result.diff)
    } else {
        Err(SnapshotError::MismatchExceedsTolerance {
            diff: result.diff,
            tolerance,
        })
    }
}

/// Decode PNG (or any format `image` recognizes) bytes into RGBA pixels
pub fn decode(bytes: &[u8]) -> SnapshotResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| SnapshotError::EncodingFailure(format!("Failed to decode image: {}", e)))
}

/// Encode RGBA pixels as PNG bytes
pub fn encode_png(image: &RgbaImage) -> SnapshotResult<Vec<u8>> {
    ensure_encodable(image, "snapshot")?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| SnapshotError::EncodingFailure(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}
