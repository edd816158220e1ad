//! Resampling with the image crate.

use image::imageops::FilterType;
use image::DynamicImage;

/// Resample to exactly `width` x `height` with Lanczos3.
///
/// Returns a clone when the dimensions already match so callers never pay
/// for a no-op filter pass.
pub fn resample(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (width, height) = (width.max(1), height.max(1));
    if img.width() == width && img.height() == height {
        return img.clone();
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}
