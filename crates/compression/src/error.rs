//! Error types for the compression crate.

use imgfit_core::ErrorCode;
use imgfit_image::CodecError;
use thiserror::Error;

/// Result type alias for compression operations.
pub type Result<T> = std::result::Result<T, CompressionError>;

/// Suggestion attached to unrecoverable metadata failures.
pub const METADATA_SUGGESTION: &str =
    "Remove the image metadata (EXIF) or convert the image to JPEG before compressing";

/// Errors that can occur while fitting an image to a byte budget.
///
/// Missing the budget is not an error: the search returns a best-effort
/// result with a warning instead.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The request was rejected before any decode
    #[error("{0}")]
    InvalidInput(String),

    /// The input bytes could not be decoded
    #[error(transparent)]
    Decode(CodecError),

    /// An encode failed for a reason unrelated to metadata
    #[error(transparent)]
    Encode(CodecError),

    /// Metadata could not be written, even after the recovery ladder
    #[error("Image metadata could not be encoded after {attempts} attempt(s): {last}")]
    MetadataEncoding {
        /// Strategies tried before giving up
        attempts: usize,
        /// Failure of the last strategy
        #[source]
        last: CodecError,
    },
}

impl CompressionError {
    /// Classify a codec failure raised while encoding.
    pub(crate) fn from_encode(err: CodecError) -> Self {
        if err.is_metadata() {
            Self::MetadataEncoding {
                attempts: 1,
                last: err,
            }
        } else {
            Self::Encode(err)
        }
    }

    /// True when the recovery ladder may retry with another strategy.
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::MetadataEncoding { .. })
    }

    /// Error code reported to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Decode(_) => ErrorCode::DecodeFailed,
            Self::Encode(_) => ErrorCode::EncodeFailed,
            Self::MetadataEncoding { .. } => ErrorCode::MetadataEncoding,
        }
    }

    /// Something the user can do about it, if anything.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Decode(_) => Some("Check that the input is a JPEG, PNG, GIF or WebP image"),
            Self::MetadataEncoding { .. } => Some(METADATA_SUGGESTION),
            _ => None,
        }
    }
}

impl From<CompressionError> for imgfit_core::Error {
    fn from(err: CompressionError) -> Self {
        let mut out = imgfit_core::Error::new(err.code(), err.to_string());
        if let Some(suggestion) = err.suggestion() {
            out = out.with_suggestion(suggestion);
        }
        match err {
            CompressionError::Decode(source)
            | CompressionError::Encode(source)
            | CompressionError::MetadataEncoding { last: source, .. } => out.with_source(source),
            CompressionError::InvalidInput(_) => out,
        }
    }
}
