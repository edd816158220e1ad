//! Container encoders and the metadata-stripping ladder.
//!
//! | Output | Encoder | Notes |
//! |---|---|---|
//! | JPEG | `image::codecs::jpeg::JpegEncoder` | alpha flattened onto white first |
//! | PNG | `image::codecs::png::PngEncoder` | best compression, adaptive filter |
//! | WebP | `webp` (libwebp) | lossy, method 0-6 |

use crate::alpha::{flatten_alpha, has_alpha_channel, WHITE};
use crate::{CodecError, ColorMode, OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder};

const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Largest EXIF payload a single APP1 segment can carry.
pub const MAX_JPEG_EXIF: usize = u16::MAX as usize - 2 - EXIF_PREFIX.len();

/// How much of the source layout survives an encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripLevel {
    /// Native color layout, no metadata
    Plain,
    /// Plain 8-bit RGB, no optional chunks
    MinimalRgb,
}

impl StripLevel {
    /// Order tried when metadata stripping is requested.
    pub const LADDER: [StripLevel; 2] = [StripLevel::Plain, StripLevel::MinimalRgb];
}

/// Encode pixels into `format` at the given strip level.
pub fn encode_pixels(
    img: &DynamicImage,
    color: ColorMode,
    format: OutputFormat,
    quality: Quality,
    webp_method: u8,
    level: StripLevel,
) -> Result<Vec<u8>, CodecError> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(img, color, quality, level),
        OutputFormat::Png => encode_png(img, level),
        OutputFormat::WebP => encode_webp(img, quality, webp_method, level),
    }
}

fn encode_jpeg(
    img: &DynamicImage,
    color: ColorMode,
    quality: Quality,
    level: StripLevel,
) -> Result<Vec<u8>, CodecError> {
    let transparent = color.has_transparency() || has_alpha_channel(img);
    let (bytes, color_type, width, height) = if transparent {
        let rgb = flatten_alpha(img, WHITE);
        let (w, h) = rgb.dimensions();
        (rgb.into_raw(), ColorType::Rgb8, w, h)
    } else if level == StripLevel::Plain && matches!(color, ColorMode::Grayscale) {
        let luma = img.to_luma8();
        let (w, h) = luma.dimensions();
        (luma.into_raw(), ColorType::L8, w, h)
    } else {
        let rgb = img.to_rgb8();
        let (w, h) = rgb.dimensions();
        (rgb.into_raw(), ColorType::Rgb8, w, h)
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.value())
        .encode(&bytes, width, height, color_type)
        .map_err(|e| CodecError::encode("JPEG", e.to_string()))?;
    Ok(out)
}

fn encode_png(img: &DynamicImage, level: StripLevel) -> Result<Vec<u8>, CodecError> {
    let converted;
    let source = match (level, img) {
        (StripLevel::Plain, DynamicImage::ImageLuma8(_))
        | (StripLevel::Plain, DynamicImage::ImageLumaA8(_))
        | (StripLevel::Plain, DynamicImage::ImageRgb8(_))
        | (StripLevel::Plain, DynamicImage::ImageRgba8(_)) => img,
        (StripLevel::Plain, _) if has_alpha_channel(img) => {
            converted = DynamicImage::ImageRgba8(img.to_rgba8());
            &converted
        }
        _ => {
            converted = DynamicImage::ImageRgb8(img.to_rgb8());
            &converted
        }
    };

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilterType::Adaptive)
        .write_image(source.as_bytes(), source.width(), source.height(), source.color())
        .map_err(|e| CodecError::encode("PNG", e.to_string()))?;
    Ok(out)
}

fn encode_webp(
    img: &DynamicImage,
    quality: Quality,
    method: u8,
    level: StripLevel,
) -> Result<Vec<u8>, CodecError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::encode("WEBP", "Failed to create WebP config"))?;
    config.lossless = 0;
    config.quality = quality.value() as f32;
    config.method = method.min(6) as i32;

    let keep_alpha = level == StripLevel::Plain && has_alpha_channel(img);
    let memory = if keep_alpha {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_advanced(&config)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode_advanced(&config)
    }
    .map_err(|e| CodecError::encode("WEBP", format!("{e:?}")))?;

    Ok(memory.to_vec())
}

/// Splice an EXIF payload into a freshly encoded JPEG as an APP1 segment,
/// right after SOI and any JFIF APP0 segment.
pub fn insert_jpeg_exif(jpeg: Vec<u8>, exif: &[u8]) -> Result<Vec<u8>, CodecError> {
    if exif.len() > MAX_JPEG_EXIF {
        return Err(CodecError::Metadata(format!(
            "EXIF block of {} bytes exceeds the {} byte JPEG APP1 limit",
            exif.len(),
            MAX_JPEG_EXIF
        )));
    }
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(CodecError::Metadata("encoder output is not a JPEG stream".into()));
    }

    let mut insert_at = 2;
    if jpeg.len() >= 6 && jpeg[2] == 0xFF && jpeg[3] == 0xE0 {
        let app0 = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        insert_at = (4 + app0).min(jpeg.len());
    }

    let segment_len = (2 + EXIF_PREFIX.len() + exif.len()) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + exif.len() + 10);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_PREFIX);
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok(out)
}
