//! Output format selection.

use crate::RequestedFormat;
use imgfit_image::{ColorMode, ImageFormat, OutputFormat};

/// Warning when aggressive compression forces a transparent image to WebP.
pub const TRANSPARENCY_TO_WEBP: &str = "Image has transparency. Using WebP for lossy compression.";

/// Warning when a transparent PNG is kept lossless.
pub const TRANSPARENT_PNG_KEPT: &str = "PNG with transparency may not reach target size. Consider WebP.";

/// The chosen output format and any warnings the choice produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub format: OutputFormat,
    pub warnings: Vec<String>,
}

impl FormatChoice {
    fn plain(format: OutputFormat) -> Self {
        Self {
            format,
            warnings: Vec::new(),
        }
    }

    fn warned(format: OutputFormat, warning: &str) -> Self {
        Self {
            format,
            warnings: vec![warning.to_string()],
        }
    }
}

/// Pick the output container.
///
/// An explicit request always wins. Otherwise a budget below
/// `aggressive_ratio` of the current size goes to WebP, and milder budgets
/// keep JPEG and WebP sources as they are. PNG stays PNG only when it has
/// transparency; everything else becomes WebP.
pub fn choose_format(
    color: ColorMode,
    original: Option<ImageFormat>,
    target_bytes: u64,
    current_size: u64,
    requested: RequestedFormat,
    aggressive_ratio: f64,
) -> FormatChoice {
    if let Some(format) = requested.fixed() {
        return FormatChoice::plain(format);
    }

    let transparent = color.has_transparency();
    let ratio = if current_size == 0 {
        1.0
    } else {
        target_bytes as f64 / current_size as f64
    };

    if ratio < aggressive_ratio {
        return if transparent {
            FormatChoice::warned(OutputFormat::WebP, TRANSPARENCY_TO_WEBP)
        } else {
            FormatChoice::plain(OutputFormat::WebP)
        };
    }

    match original {
        Some(ImageFormat::Jpeg) => FormatChoice::plain(OutputFormat::Jpeg),
        Some(ImageFormat::Png) if transparent => {
            FormatChoice::warned(OutputFormat::Png, TRANSPARENT_PNG_KEPT)
        }
        _ => FormatChoice::plain(OutputFormat::WebP),
    }
}
