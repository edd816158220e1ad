//! Size-targeted image re-encoding for imgfit.
//!
//! This crate provides:
//! - Output format selection from color layout, source container and budget
//! - Dimension planning for the resize scales
//! - Binary quality search per scale
//! - The orchestrator that balances closeness to the budget against
//!   resolution, with a deterministic best-effort fallback
//! - A recovery ladder for metadata that cannot be encoded
//!
//! Everything pixel-related goes through [`imgfit_image::ImageCodec`].
//!
//! # Example
//!
//! ```rust,no_run
//! use imgfit_compression::{compress, CompressionRequest};
//! use imgfit_core::config::SearchConfig;
//! use imgfit_image::ImageRsCodec;
//!
//! let input = std::fs::read("photo.jpg").unwrap();
//! let request = CompressionRequest::new(500_000);
//! let result = compress(&ImageRsCodec::new(), &input, &request, &SearchConfig::default()).unwrap();
//! assert!(result.size_bytes <= 500_000 || !result.warnings.is_empty());
//! ```

mod dimensions;
mod error;
mod format;
mod orchestrator;
mod outcome;
mod quality;
mod recovery;
mod request;

#[cfg(test)]
mod mock;

pub use dimensions::plan_dimensions;
pub use error::{CompressionError, Result, METADATA_SUGGESTION};
pub use format::{choose_format, FormatChoice, TRANSPARENCY_TO_WEBP, TRANSPARENT_PNG_KEPT};
pub use orchestrator::{compress_to_target, SearchState, BEST_EFFORT_WARNING};
pub use outcome::{output_file_name, Compressed, Estimate};
pub use quality::{search_quality, Candidate, SearchParams};
pub use recovery::{compress_with_recovery, Strategy};
pub use request::{
    minimum_achievable_size, validate_request, CompressionRequest, Priority, QualityMode,
    RequestedFormat,
};

use imgfit_core::config::SearchConfig;
use imgfit_image::ImageCodec;
use tracing::instrument;

/// Validate the request, then fit the image to its byte budget.
#[instrument(
    skip(codec, data, config),
    fields(input_bytes = data.len(), target = request.target_bytes)
)]
pub fn compress<C: ImageCodec>(
    codec: &C,
    data: &[u8],
    request: &CompressionRequest,
    config: &SearchConfig,
) -> Result<Compressed> {
    validate_request(data, request, config)?;
    compress_with_recovery(codec, data, request, config)
}

/// Run the same search as [`compress`] and report the outcome without the
/// payload.
#[instrument(
    skip(codec, data, config),
    fields(input_bytes = data.len(), target = request.target_bytes)
)]
pub fn estimate<C: ImageCodec>(
    codec: &C,
    data: &[u8],
    request: &CompressionRequest,
    config: &SearchConfig,
) -> Result<Estimate> {
    compress(codec, data, request, config).map(Estimate::from)
}
