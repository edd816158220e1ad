//! Caller-facing results.

use imgfit_image::OutputFormat;
use serde::{Deserialize, Serialize};

/// A finished compression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compressed {
    /// Encoded output
    #[serde(skip)]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub format: OutputFormat,
    pub warnings: Vec<String>,
}

impl Compressed {
    pub(crate) fn new(data: Vec<u8>, width: u32, height: u32, format: OutputFormat, warnings: Vec<String>) -> Self {
        Self {
            size_bytes: data.len() as u64,
            data,
            width,
            height,
            format,
            warnings,
        }
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Download name derived from the input file name.
    pub fn file_name(&self, original_name: &str) -> String {
        output_file_name(original_name, self.format, self.size_bytes)
    }
}

/// What a compression would produce, without the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub predicted_width: u32,
    pub predicted_height: u32,
    pub estimated_size_bytes: u64,
    pub chosen_format: OutputFormat,
    pub warnings: Vec<String>,
}

impl From<Compressed> for Estimate {
    fn from(result: Compressed) -> Self {
        Self {
            predicted_width: result.width,
            predicted_height: result.height,
            estimated_size_bytes: result.size_bytes,
            chosen_format: result.format,
            warnings: result.warnings,
        }
    }
}

/// `{stem}_compressed_{MB:.2}MB.{ext}`, where the stem is everything before
/// the last dot.
pub fn output_file_name(original_name: &str, format: OutputFormat, size_bytes: u64) -> String {
    let name = if original_name.is_empty() { "image" } else { original_name };
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let megabytes = size_bytes as f64 / (1024.0 * 1024.0);
    format!("{stem}_compressed_{megabytes:.2}MB.{}", format.extension())
}
