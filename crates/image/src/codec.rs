//! The codec capability the search engine is written against.
//!
//! [`ImageCodec`] is the narrow seam between the size-targeting search and
//! the pixel work. The search only ever decodes once, resizes, and encodes;
//! it never looks at pixels itself, so the descriptor is generic over the
//! pixel handle. The production implementation is
//! [`ImageRsCodec`](crate::ImageRsCodec); tests plug in synthetic codecs
//! that only model output sizes.

use crate::{CodecError, ImageFormat};
use serde::{Deserialize, Serialize};

/// Color layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Single luma channel
    Grayscale,
    /// Luma plus alpha
    GrayscaleAlpha,
    /// Three color channels
    Rgb,
    /// Three color channels plus alpha
    Rgba,
    /// Indexed color, optionally with a transparent palette entry
    Palette {
        /// Palette carries transparency (PNG `tRNS`)
        transparency: bool,
    },
}

impl ColorMode {
    /// True for alpha-bearing modes and palettes with a transparent entry.
    pub fn has_transparency(&self) -> bool {
        match self {
            ColorMode::GrayscaleAlpha | ColorMode::Rgba => true,
            ColorMode::Palette { transparency } => *transparency,
            ColorMode::Grayscale | ColorMode::Rgb => false,
        }
    }

    /// True only for modes with a real alpha channel.
    pub fn has_alpha_channel(&self) -> bool {
        matches!(self, ColorMode::GrayscaleAlpha | ColorMode::Rgba)
    }
}

/// Lossy encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Lowest accepted quality.
    pub const MIN: Quality = Quality(1);
    /// Highest accepted quality.
    pub const MAX: Quality = Quality(100);

    /// Create a quality, clamping into 1..=100.
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Raw value.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Containers the codec can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    /// Lossy, three channel
    Jpeg,
    /// Lossless
    Png,
    /// Lossy, alpha capable
    WebP,
}

impl OutputFormat {
    /// Upper-case name reported to callers.
    pub fn name(&self) -> &'static str {
        self.container().name()
    }

    /// Whether the encoder exposes a quality knob.
    pub fn is_lossy(&self) -> bool {
        !matches!(self, OutputFormat::Png)
    }

    /// The matching container format.
    pub fn container(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    /// True when `source` is the same container as this output.
    pub fn matches(&self, source: Option<ImageFormat>) -> bool {
        source == Some(self.container())
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        self.container().mime_type()
    }

    /// Preferred file extension.
    pub fn extension(&self) -> &'static str {
        self.container().extension()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded image plus what the search needs to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor<P> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color layout of the source
    pub color: ColorMode,
    /// Container the bytes came in, if recognised
    pub source_format: Option<ImageFormat>,
    /// Raw EXIF payload (TIFF header onwards) found in the source
    pub exif: Option<Vec<u8>>,
    /// Codec-specific pixel handle
    pub pixels: P,
}

impl<P> ImageDescriptor<P> {
    /// Same metadata, different pixels and dimensions.
    pub fn with_pixels<Q>(&self, width: u32, height: u32, pixels: Q) -> ImageDescriptor<Q> {
        ImageDescriptor {
            width,
            height,
            color: self.color,
            source_format: self.source_format,
            exif: self.exif.clone(),
            pixels,
        }
    }
}

/// Decode, resize and encode: everything the search asks of a codec.
///
/// Implementations must be deterministic: the same descriptor and
/// parameters always produce the same bytes.
pub trait ImageCodec: Sync {
    /// Codec-specific pixel storage.
    type Pixels: Clone;

    /// Decode container bytes.
    fn decode(&self, data: &[u8]) -> Result<ImageDescriptor<Self::Pixels>, CodecError>;

    /// Resample to exactly `width` x `height`.
    fn resize(
        &self,
        image: &ImageDescriptor<Self::Pixels>,
        width: u32,
        height: u32,
    ) -> ImageDescriptor<Self::Pixels>;

    /// Encode to `format`. `quality` is ignored for lossless output.
    ///
    /// With `strip_metadata` the implementation must not embed any source
    /// metadata and should fall back to simpler encodes rather than fail.
    fn encode(
        &self,
        image: &ImageDescriptor<Self::Pixels>,
        format: OutputFormat,
        quality: Quality,
        strip_metadata: bool,
    ) -> Result<Vec<u8>, CodecError>;
}
