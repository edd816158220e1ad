//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for header-level image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors raised while sniffing or inspecting image bytes.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),
}

/// Errors surfaced by an [`ImageCodec`](crate::ImageCodec).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The encoder rejected the pixels or parameters
    #[error("Failed to encode {format}: {message}")]
    Encode {
        /// Output format being written
        format: &'static str,
        /// Encoder message
        message: String,
    },

    /// Embedded metadata could not be serialized into the output container
    #[error("Failed to encode image metadata: {0}")]
    Metadata(String),
}

impl CodecError {
    /// Build an encode failure for the given output format.
    pub fn encode(format: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            format,
            message: message.into(),
        }
    }

    /// True when the failure came from metadata serialization.
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }
}
