//! Quality search at a fixed scale.

use crate::{CompressionError, QualityMode, Result};
use imgfit_core::config::SearchConfig;
use imgfit_image::{ImageCodec, ImageDescriptor, OutputFormat, Quality};
use tracing::debug;

/// One encoded attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Encoded bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// Quality used, `None` for lossless output
    pub quality: Option<Quality>,
}

impl Candidate {
    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Fits the budget.
    pub fn is_acceptable(&self, target_bytes: u64) -> bool {
        self.size() <= target_bytes
    }

    /// Bytes left under the budget, `None` when over it.
    pub fn distance(&self, target_bytes: u64) -> Option<u64> {
        target_bytes.checked_sub(self.size())
    }
}

/// Encoder settings shared by every probe of one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    pub format: OutputFormat,
    pub target_bytes: u64,
    pub mode: QualityMode,
    pub strip_metadata: bool,
    pub config: &'a SearchConfig,
}

/// Find the best encode of `image` at its current size.
///
/// Lossy formats return the acceptable candidate closest to the budget, or
/// `None` when nothing fits. Auto mode binary-searches the configured
/// quality range: a probe that fits moves the floor up, one that does not
/// moves the ceiling down. Lossless output is encoded once and returned
/// whether or not it fits.
pub fn search_quality<C: ImageCodec>(
    codec: &C,
    image: &ImageDescriptor<C::Pixels>,
    params: SearchParams<'_>,
) -> Result<Option<Candidate>> {
    let SearchParams {
        format,
        target_bytes,
        mode,
        strip_metadata,
        config,
    } = params;

    let encode = |quality: Quality| -> Result<Candidate> {
        let data = codec
            .encode(image, format, quality, strip_metadata)
            .map_err(CompressionError::from_encode)?;
        Ok(Candidate {
            data,
            width: image.width,
            height: image.height,
            format,
            quality: format.is_lossy().then_some(quality),
        })
    };

    if !format.is_lossy() {
        let candidate = encode(Quality::new(config.lossless_quality))?;
        debug!(
            width = image.width,
            height = image.height,
            size = candidate.size(),
            target = target_bytes,
            "lossless encode"
        );
        return Ok(Some(candidate));
    }

    if let QualityMode::Manual(q) = mode {
        let candidate = encode(Quality::new(q))?;
        debug!(quality = q, size = candidate.size(), target = target_bytes, "manual quality probe");
        return Ok(candidate.is_acceptable(target_bytes).then_some(candidate));
    }

    let mut low = i32::from(config.quality_floor);
    let mut high = i32::from(config.quality_ceiling);
    let mut best: Option<Candidate> = None;

    for probe in 0..config.max_probes {
        if low > high {
            break;
        }
        let mid = (low + high) / 2;
        let candidate = encode(Quality::new(mid as u8))?;
        let fits = candidate.is_acceptable(target_bytes);
        debug!(
            probe,
            quality = mid,
            size = candidate.size(),
            target = target_bytes,
            fits,
            "quality probe"
        );

        if fits {
            // ties go to the later, higher-quality probe
            let as_close = match &best {
                Some(current) => candidate.distance(target_bytes) <= current.distance(target_bytes),
                None => true,
            };
            if as_close {
                best = Some(candidate);
            }
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    Ok(best)
}
