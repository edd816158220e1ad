//! Production codec built on the `image` and `webp` crates.

use crate::encode::{encode_pixels, insert_jpeg_exif, StripLevel};
use crate::{
    detect_format, extract_exif, inspect, resize, CodecError, ColorMode, ImageCodec,
    ImageDescriptor, ImageFormat, OutputFormat, Quality,
};
use image::{ColorType, DynamicImage};
use tracing::debug;

/// Default libwebp effort (0 = fast, 6 = smallest output).
pub const DEFAULT_WEBP_METHOD: u8 = 6;

/// [`ImageCodec`] backed by pure-Rust decoders, Lanczos3 resampling and
/// libwebp for lossy WebP output.
#[derive(Debug, Clone, Copy)]
pub struct ImageRsCodec {
    webp_method: u8,
}

impl Default for ImageRsCodec {
    fn default() -> Self {
        Self {
            webp_method: DEFAULT_WEBP_METHOD,
        }
    }
}

impl ImageRsCodec {
    /// Codec with default encoder settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the libwebp effort level (clamped to 0-6).
    pub fn with_webp_method(mut self, method: u8) -> Self {
        self.webp_method = method.min(6);
        self
    }

    fn encode_at(
        &self,
        image: &ImageDescriptor<DynamicImage>,
        format: OutputFormat,
        quality: Quality,
        level: StripLevel,
    ) -> Result<Vec<u8>, CodecError> {
        encode_pixels(&image.pixels, image.color, format, quality, self.webp_method, level)
    }
}

impl ImageCodec for ImageRsCodec {
    type Pixels = DynamicImage;

    fn decode(&self, data: &[u8]) -> Result<ImageDescriptor<DynamicImage>, CodecError> {
        let pixels =
            image::load_from_memory(data).map_err(|e| CodecError::Decode(e.to_string()))?;

        // Decoding expands palettes and PNG tRNS into an alpha channel; the
        // header still has the stored layout.
        let stored = inspect(data).ok().and_then(|info| Some((info.format, info.color?)));
        let color = match stored {
            Some((_, palette @ ColorMode::Palette { .. })) => palette,
            Some((ImageFormat::Png, stored)) => stored,
            _ => color_mode(pixels.color()),
        };

        let descriptor = ImageDescriptor {
            width: pixels.width(),
            height: pixels.height(),
            color,
            source_format: detect_format(data).ok(),
            exif: extract_exif(data),
            pixels,
        };
        debug!(
            width = descriptor.width,
            height = descriptor.height,
            color = ?descriptor.color,
            source = ?descriptor.source_format,
            exif = descriptor.exif.is_some(),
            "decoded image"
        );
        Ok(descriptor)
    }

    fn resize(
        &self,
        image: &ImageDescriptor<DynamicImage>,
        width: u32,
        height: u32,
    ) -> ImageDescriptor<DynamicImage> {
        let pixels = resize::resample(&image.pixels, width, height);
        image.with_pixels(pixels.width(), pixels.height(), pixels)
    }

    fn encode(
        &self,
        image: &ImageDescriptor<DynamicImage>,
        format: OutputFormat,
        quality: Quality,
        strip_metadata: bool,
    ) -> Result<Vec<u8>, CodecError> {
        if !strip_metadata {
            let bytes = self.encode_at(image, format, quality, StripLevel::Plain)?;
            return match (&image.exif, format) {
                (Some(exif), OutputFormat::Jpeg) => insert_jpeg_exif(bytes, exif),
                _ => Ok(bytes),
            };
        }

        let mut failure = None;
        for level in StripLevel::LADDER {
            match self.encode_at(image, format, quality, level) {
                Ok(bytes) => return Ok(bytes),
                Err(err) => {
                    debug!(?level, error = %err, "stripped encode failed, trying a simpler one");
                    failure = Some(err);
                }
            }
        }
        Err(failure.unwrap_or_else(|| CodecError::encode(format.name(), "no encode strategy left")))
    }
}

fn color_mode(color: ColorType) -> ColorMode {
    match color {
        ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
        ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
        c if c.has_alpha() => ColorMode::Rgba,
        _ => ColorMode::Rgb,
    }
}
