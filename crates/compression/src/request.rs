//! What the caller asks for, and the checks run before any pixel work.

use crate::{CompressionError, Result};
use imgfit_core::config::SearchConfig;
use imgfit_image::{inspect, ImageFormat, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output container requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedFormat {
    /// Let the format selector decide
    #[default]
    Auto,
    /// Force JPEG
    Jpeg,
    /// Force PNG
    Png,
    /// Force WebP
    WebP,
}

impl RequestedFormat {
    /// The forced output format, or `None` for [`RequestedFormat::Auto`].
    pub fn fixed(self) -> Option<OutputFormat> {
        match self {
            Self::Auto => None,
            Self::Jpeg => Some(OutputFormat::Jpeg),
            Self::Png => Some(OutputFormat::Png),
            Self::WebP => Some(OutputFormat::WebP),
        }
    }
}

impl FromStr for RequestedFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        match ImageFormat::from_name(s) {
            Some(ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Some(ImageFormat::Png) => Ok(Self::Png),
            Some(ImageFormat::WebP) => Ok(Self::WebP),
            _ => Err(format!("unknown output format '{s}' (expected auto, jpeg, png or webp)")),
        }
    }
}

impl fmt::Display for RequestedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed() {
            Some(format) => f.write_str(&format.name().to_ascii_lowercase()),
            None => f.write_str("auto"),
        }
    }
}

/// How the encoder quality is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityMode {
    /// Binary search over the configured quality range
    #[default]
    Auto,
    /// Encode once at this quality
    Manual(u8),
}

/// Which way to give when the budget is tight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Shrink dimensions as needed to land close to the budget
    #[default]
    TargetSize,
    /// Keep full resolution and only lower quality
    OptimalResolution,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "target_size" | "size" => Ok(Self::TargetSize),
            "optimal_resolution" | "resolution" => Ok(Self::OptimalResolution),
            other => Err(format!(
                "unknown priority '{other}' (expected target_size or optimal_resolution)"
            )),
        }
    }
}

/// A request to re-encode one image under a byte budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    /// Upper bound on the output size
    pub target_bytes: u64,
    /// Requested output container
    pub output_format: RequestedFormat,
    /// Cap on the larger output dimension
    pub max_dim: Option<u32>,
    /// Quality selection
    pub quality: QualityMode,
    /// Resolution versus budget trade-off
    pub priority: Priority,
    /// Drop source metadata from the output
    pub strip_exif: bool,
}

impl CompressionRequest {
    /// Request with every option at its default.
    pub fn new(target_bytes: u64) -> Self {
        Self {
            target_bytes,
            output_format: RequestedFormat::Auto,
            max_dim: None,
            quality: QualityMode::Auto,
            priority: Priority::TargetSize,
            strip_exif: false,
        }
    }

    pub fn with_format(mut self, format: RequestedFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_max_dim(mut self, max_dim: u32) -> Self {
        self.max_dim = Some(max_dim);
        self
    }

    pub fn with_quality(mut self, quality: QualityMode) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_strip_exif(mut self, strip: bool) -> Self {
        self.strip_exif = strip;
        self
    }
}

/// Reject requests that cannot or should not be searched.
///
/// Runs on the raw bytes only: nothing here decodes pixels.
pub fn validate_request(
    data: &[u8],
    request: &CompressionRequest,
    config: &SearchConfig,
) -> Result<()> {
    let invalid = |msg: String| Err(CompressionError::InvalidInput(msg));

    if data.is_empty() {
        return invalid("Empty file uploaded".into());
    }
    if request.target_bytes == 0 {
        return invalid("Target size must be greater than 0 bytes".into());
    }
    if let QualityMode::Manual(q) = request.quality {
        if q < config.quality_floor || q > 100 {
            return invalid(format!(
                "Manual quality must be between {} and 100, got {q}",
                config.quality_floor
            ));
        }
    }
    if request.max_dim == Some(0) {
        return invalid("Maximum dimension must be greater than 0".into());
    }

    let original = data.len() as u64;
    if request.target_bytes >= original {
        return invalid(format!(
            "Target size ({} bytes) must be smaller than original ({original} bytes)",
            request.target_bytes
        ));
    }

    let minimum = minimum_achievable_size(data);
    if request.target_bytes < minimum {
        return invalid(format!(
            "Target size ({} bytes) is below the minimum achievable size for this image ({minimum} bytes)",
            request.target_bytes
        ));
    }
    Ok(())
}

/// Rough floor on how small this image can get, from headers alone.
///
/// Alpha-bearing images keep 8%, other PNGs 10%, everything else 5%.
/// Inputs under 50 KB keep 15% because container overhead dominates.
pub fn minimum_achievable_size(data: &[u8]) -> u64 {
    let size = data.len() as u64;
    let ratio = match inspect(data) {
        Ok(_) if size < 50_000 => 0.15,
        Ok(info) if info.has_alpha() => 0.08,
        Ok(info) if info.format == ImageFormat::Png => 0.10,
        _ => 0.05,
    };
    (size as f64 * ratio) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(color_type: u8, padding: usize) -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&64u32.to_be_bytes());
        data.extend_from_slice(&48u32.to_be_bytes());
        data.extend_from_slice(&[8, color_type, 0, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.resize(padding, 0);
        data
    }

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn test_minimum_size_ratios() {
        assert_eq!(minimum_achievable_size(&png_header(6, 100_000)), 8_000);
        assert_eq!(minimum_achievable_size(&png_header(2, 100_000)), 10_000);
        assert_eq!(minimum_achievable_size(&png_header(6, 40_000)), 6_000);
        // unreadable header
        assert_eq!(minimum_achievable_size(&vec![7u8; 100_000]), 5_000);
    }

    #[test]
    fn test_small_png_with_alpha_accepts_target() {
        let data = png_header(6, 40_000);
        let request = CompressionRequest::new(35_000);
        assert!(validate_request(&data, &request, &config()).is_ok());
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = validate_request(&[], &CompressionRequest::new(10), &config()).unwrap_err();
        assert_eq!(err.to_string(), "Empty file uploaded");
    }

    #[test]
    fn test_target_must_be_smaller_than_original() {
        let data = png_header(2, 1_000);
        let err = validate_request(&data, &CompressionRequest::new(1_000), &config()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Target size (1000 bytes) must be smaller than original (1000 bytes)"
        );
    }

    #[test]
    fn test_manual_quality_below_floor_rejected() {
        let data = png_header(2, 100_000);
        let request = CompressionRequest::new(50_000).with_quality(QualityMode::Manual(10));
        assert!(matches!(
            validate_request(&data, &request, &config()),
            Err(CompressionError::InvalidInput(_))
        ));

        let ok = CompressionRequest::new(50_000).with_quality(QualityMode::Manual(40));
        assert!(validate_request(&data, &ok, &config()).is_ok());
    }

    #[test]
    fn test_zero_target_and_zero_max_dim_rejected() {
        let data = png_header(2, 100_000);
        assert!(validate_request(&data, &CompressionRequest::new(0), &config()).is_err());
        let request = CompressionRequest::new(50_000).with_max_dim(0);
        assert!(validate_request(&data, &request, &config()).is_err());
    }

    #[test]
    fn test_target_below_minimum_rejected() {
        let data = png_header(2, 100_000);
        let err = validate_request(&data, &CompressionRequest::new(9_999), &config()).unwrap_err();
        assert!(err.to_string().contains("minimum achievable size"));
    }

    #[test]
    fn test_parse_format_and_priority() {
        assert_eq!("JPG".parse::<RequestedFormat>(), Ok(RequestedFormat::Jpeg));
        assert_eq!("webp".parse::<RequestedFormat>(), Ok(RequestedFormat::WebP));
        assert!("tiff".parse::<RequestedFormat>().is_err());
        assert_eq!(".jpeg".parse::<RequestedFormat>(), Ok(RequestedFormat::Jpeg));
        assert_eq!("PNG".parse::<RequestedFormat>(), Ok(RequestedFormat::Png));
        assert_eq!("Auto".parse::<RequestedFormat>(), Ok(RequestedFormat::Auto));
        assert!("gif".parse::<RequestedFormat>().is_err());
        assert!("jpegxl".parse::<RequestedFormat>().is_err());
        assert_eq!(RequestedFormat::WebP.to_string(), "webp");
        assert_eq!("optimal-resolution".parse::<Priority>(), Ok(Priority::OptimalResolution));
        assert_eq!("target_size".parse::<Priority>(), Ok(Priority::TargetSize));
    }
}
