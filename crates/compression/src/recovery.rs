//! Recovery ladder for metadata that cannot be written.
//!
//! Each rung reruns the whole search with a more conservative request.
//! Only metadata failures move down the ladder; anything else is returned
//! as is.

use crate::orchestrator::compress_to_target;
use crate::{CompressionError, CompressionRequest, Compressed, RequestedFormat, Result};
use imgfit_core::config::SearchConfig;
use imgfit_image::{CodecError, ImageCodec};
use tracing::{debug, warn};

/// One rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The request unchanged
    AsRequested,
    /// Same request with metadata stripped
    StripMetadata,
    /// JPEG output, metadata stripped
    ForceJpeg,
}

impl Strategy {
    /// Rungs in the order they are tried.
    pub const LADDER: [Strategy; 3] = [Strategy::AsRequested, Strategy::StripMetadata, Strategy::ForceJpeg];

    /// The request this rung runs, or `None` when it would repeat the
    /// original request.
    pub fn apply(self, request: &CompressionRequest) -> Option<CompressionRequest> {
        let adjusted = match self {
            Strategy::AsRequested => return Some(request.clone()),
            Strategy::StripMetadata => request.clone().with_strip_exif(true),
            Strategy::ForceJpeg => request
                .clone()
                .with_format(RequestedFormat::Jpeg)
                .with_strip_exif(true),
        };
        (adjusted != *request).then_some(adjusted)
    }

    /// Warning added to a result produced by this rung.
    pub fn recovery_warning(self) -> Option<&'static str> {
        match self {
            Strategy::AsRequested => None,
            Strategy::StripMetadata => {
                Some("Image metadata could not be encoded and was removed from the output.")
            }
            Strategy::ForceJpeg => {
                Some("Image metadata could not be encoded. The image was converted to JPEG without metadata.")
            }
        }
    }
}

/// Run the search, walking down [`Strategy::LADDER`] on metadata failures.
pub fn compress_with_recovery<C: ImageCodec>(
    codec: &C,
    data: &[u8],
    request: &CompressionRequest,
    config: &SearchConfig,
) -> Result<Compressed> {
    let mut attempts = 0;
    let mut last: Option<CodecError> = None;

    for strategy in Strategy::LADDER {
        let Some(adjusted) = strategy.apply(request) else {
            debug!(?strategy, "strategy repeats the request, skipping");
            continue;
        };
        attempts += 1;

        match compress_to_target(codec, data, &adjusted, config) {
            Ok(mut result) => {
                if let Some(warning) = strategy.recovery_warning() {
                    warn!(?strategy, "recovered from metadata encoding failure");
                    result.warnings.push(warning.to_string());
                }
                return Ok(result);
            }
            Err(CompressionError::MetadataEncoding { last: err, .. }) => {
                warn!(?strategy, error = %err, "metadata encoding failed, trying next strategy");
                last = Some(err);
            }
            Err(other) => return Err(other),
        }
    }

    Err(CompressionError::MetadataEncoding {
        attempts,
        last: last.unwrap_or_else(|| CodecError::Metadata("no strategy could run".into())),
    })
}
