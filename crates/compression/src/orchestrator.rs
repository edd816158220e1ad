//! The size-targeting search: format, then scales, then quality.

use crate::dimensions::plan_dimensions;
use crate::format::choose_format;
use crate::quality::{search_quality, Candidate, SearchParams};
use crate::{CompressionError, CompressionRequest, Compressed, Priority, Result};
use imgfit_core::config::SearchConfig;
use imgfit_image::{ImageCodec, ImageDescriptor, OutputFormat, Quality};
use tracing::{debug, info, instrument, warn};

/// Warning attached to the best-effort fallback.
pub const BEST_EFFORT_WARNING: &str = "Could not reach target size. This is the best effort result.";

/// Best candidate so far plus the warnings collected on the way.
#[derive(Debug)]
pub struct SearchState {
    target_bytes: u64,
    best: Option<Candidate>,
    warnings: Vec<String>,
}

impl SearchState {
    pub fn new(target_bytes: u64) -> Self {
        Self {
            target_bytes,
            best: None,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    /// Distance of the best candidate, when it fits.
    pub fn best_distance(&self) -> Option<u64> {
        self.best.as_ref()?.distance(self.target_bytes)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Keep `candidate` if it fits and lands closer to the budget.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let Some(distance) = candidate.distance(self.target_bytes) else {
            return false;
        };
        if self.best_distance().is_some_and(|best| best <= distance) {
            return false;
        }
        self.best = Some(candidate);
        true
    }

    /// Keep `candidate` if it is smaller than the best so far, fitting or not.
    pub fn offer_smallest(&mut self, candidate: Candidate) -> bool {
        if self.best.as_ref().is_some_and(|best| best.size() <= candidate.size()) {
            return false;
        }
        self.best = Some(candidate);
        true
    }

    /// Best candidate is within `ratio` of the budget.
    pub fn is_close_enough(&self, ratio: f64) -> bool {
        self.best_distance()
            .is_some_and(|distance| (distance as f64) < self.target_bytes as f64 * ratio)
    }
}

/// Search for the encode of `data` that best approaches the byte budget.
///
/// Does not validate the request; callers normally go through
/// [`compress`](crate::compress). An input already within budget whose
/// container matches the chosen format is returned untouched. When no
/// candidate fits, the result is a low-quality half-size encode carrying a
/// warning rather than an error.
#[instrument(
    level = "debug",
    skip(codec, data, config),
    fields(input_bytes = data.len(), target = request.target_bytes)
)]
pub fn compress_to_target<C: ImageCodec>(
    codec: &C,
    data: &[u8],
    request: &CompressionRequest,
    config: &SearchConfig,
) -> Result<Compressed> {
    let image = codec.decode(data).map_err(CompressionError::Decode)?;
    let original_size = data.len() as u64;
    let target = request.target_bytes;

    let choice = choose_format(
        image.color,
        image.source_format,
        target,
        original_size,
        request.output_format,
        config.aggressive_ratio,
    );
    let format = choice.format;
    let mut state = SearchState::new(target);
    choice.warnings.into_iter().for_each(|w| state.warn(w));
    info!(%format, width = image.width, height = image.height, "output format chosen");

    if original_size <= target && format.matches(image.source_format) {
        info!(size = original_size, "input already fits, passing through");
        return Ok(Compressed::new(
            data.to_vec(),
            image.width,
            image.height,
            format,
            state.warnings,
        ));
    }

    let scales: &[f64] = match request.priority {
        Priority::OptimalResolution => &[1.0],
        Priority::TargetSize => &config.scales,
    };
    let params = SearchParams {
        format,
        target_bytes: target,
        mode: request.quality,
        strip_metadata: request.strip_exif,
        config,
    };

    for &scale in scales {
        let (width, height) = plan_dimensions(image.width, image.height, request.max_dim, scale);
        let resized = resize_if_needed(codec, &image, width, height);
        let working = resized.as_ref().unwrap_or(&image);

        let Some(candidate) = search_quality(codec, working, params)? else {
            debug!(scale, width, height, "nothing fits at this scale");
            continue;
        };
        debug!(scale, width, height, size = candidate.size(), "scale candidate");

        if format.is_lossy() {
            state.offer(candidate);
            if state.is_close_enough(config.close_enough_ratio) {
                debug!(scale, "within tolerance of the target, stopping");
                break;
            }
        } else {
            let fits = candidate.is_acceptable(target);
            state.offer_smallest(candidate);
            if fits {
                break;
            }
        }
    }

    let SearchState { best, mut warnings, .. } = state;
    let result = match best {
        Some(best) => {
            if !best.is_acceptable(target) {
                warn!(size = best.size(), target, "lossless output is over budget");
                warnings.push(format!(
                    "Could not reach exact target. Output is {} bytes (target was {target}).",
                    best.size()
                ));
            }
            best
        }
        None => {
            warn!(target, "no candidate fits, falling back to best effort");
            let fallback = best_effort(codec, &image, request, config, format)?;
            warnings.push(BEST_EFFORT_WARNING.to_string());
            fallback
        }
    };

    info!(
        size = result.size(),
        width = result.width,
        height = result.height,
        quality = result.quality.map(Quality::value),
        "search finished"
    );
    Ok(Compressed::new(result.data, result.width, result.height, format, warnings))
}

fn resize_if_needed<C: ImageCodec>(
    codec: &C,
    image: &ImageDescriptor<C::Pixels>,
    width: u32,
    height: u32,
) -> Option<ImageDescriptor<C::Pixels>> {
    ((width, height) != (image.width, image.height)).then(|| codec.resize(image, width, height))
}

fn best_effort<C: ImageCodec>(
    codec: &C,
    image: &ImageDescriptor<C::Pixels>,
    request: &CompressionRequest,
    config: &SearchConfig,
    format: OutputFormat,
) -> Result<Candidate> {
    let (width, height) =
        plan_dimensions(image.width, image.height, request.max_dim, config.fallback_scale);
    let resized = resize_if_needed(codec, image, width, height);
    let working = resized.as_ref().unwrap_or(image);
    let quality = Quality::new(config.fallback_quality);

    let data = codec
        .encode(working, format, quality, request.strip_exif)
        .map_err(CompressionError::from_encode)?;
    Ok(Candidate {
        data,
        width,
        height,
        format,
        quality: format.is_lossy().then_some(quality),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{model_size, MockCodec, Op};
    use crate::{QualityMode, RequestedFormat};
    use imgfit_image::{ColorMode, ImageFormat};

    fn run(codec: &MockCodec, input_len: usize, request: &CompressionRequest) -> Compressed {
        compress_to_target(codec, &vec![1u8; input_len], request, &SearchConfig::default()).unwrap()
    }

    fn candidate(size: usize) -> Candidate {
        Candidate {
            data: vec![0; size],
            width: 1,
            height: 1,
            format: OutputFormat::Jpeg,
            quality: None,
        }
    }

    #[test]
    fn test_state_prefers_closest_fitting() {
        let mut state = SearchState::new(100);
        assert!(!state.offer(candidate(120)));
        assert!(state.offer(candidate(50)));
        assert!(state.offer(candidate(90)));
        assert!(!state.offer(candidate(80)));
        assert_eq!(state.best_distance(), Some(10));
        assert!(!state.is_close_enough(0.05));
        assert!(state.offer(candidate(97)));
        assert!(state.is_close_enough(0.05));
    }

    #[test]
    fn test_state_lossless_keeps_smallest() {
        let mut state = SearchState::new(100);
        assert!(state.offer_smallest(candidate(300)));
        assert!(state.offer_smallest(candidate(200)));
        assert!(!state.offer_smallest(candidate(250)));
        assert_eq!(state.best().map(Candidate::size), Some(200));
        assert_eq!(state.best_distance(), None);
    }

    #[test]
    fn test_pass_through_returns_original_bytes() {
        let codec = MockCodec::new();
        let data: Vec<u8> = (0..500u32).map(|i| i as u8).collect();
        let result = compress_to_target(&codec, &data, &CompressionRequest::new(1_000), &SearchConfig::default()).unwrap();

        assert_eq!(result.data, data);
        assert_eq!((result.width, result.height), (100, 100));
        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(codec.ops(), vec![Op::Decode]);
    }

    #[test]
    fn test_no_pass_through_when_format_changes() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(20_000).with_format(RequestedFormat::WebP);
        let result = run(&codec, 500, &request);
        assert_eq!(result.format, OutputFormat::WebP);
        assert!(codec.encodes() > 0);
    }

    #[test]
    fn test_close_result_at_full_scale_stops_early() {
        let codec = MockCodec::new();
        // 100x100 JPEG at quality 95 is 9659 bytes
        let result = run(&codec, 15_000, &CompressionRequest::new(9_700));

        assert_eq!(result.size_bytes, 9_659);
        assert_eq!((result.width, result.height), (100, 100));
        assert!(codec.resizes().is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scales_down_until_close() {
        let codec = MockCodec::new();
        let result = run(&codec, 5_000, &CompressionRequest::new(3_000));

        assert_eq!(codec.resizes(), vec![(90, 90), (80, 80)]);
        assert_eq!((result.width, result.height), (80, 80));
        assert_eq!(result.size_bytes, model_size(80, 80, OutputFormat::Jpeg, 45));
        assert!(result.size_bytes <= 3_000);
    }

    #[test]
    fn test_fallback_when_nothing_fits() {
        let codec = MockCodec::new();
        let result = run(&codec, 1_000, &CompressionRequest::new(100));

        assert_eq!(result.format, OutputFormat::WebP);
        assert_eq!((result.width, result.height), (50, 50));
        assert_eq!(result.size_bytes, model_size(50, 50, OutputFormat::WebP, 40));
        assert_eq!(result.warnings, vec![BEST_EFFORT_WARNING.to_string()]);
        assert_eq!(codec.resizes().last(), Some(&(50, 50)));
    }

    #[test]
    fn test_optimal_resolution_tries_one_scale() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(6_000).with_priority(Priority::OptimalResolution);
        let result = run(&codec, 10_000, &request);

        assert_eq!((result.width, result.height), (100, 100));
        assert!(codec.resizes().is_empty());
        assert!(result.size_bytes <= 6_000);
    }

    #[test]
    fn test_optimal_resolution_falls_back_at_half_scale() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(3_000).with_priority(Priority::OptimalResolution);
        let result = run(&codec, 5_000, &request);

        assert_eq!(codec.resizes(), vec![(50, 50)]);
        assert_eq!(result.warnings, vec![BEST_EFFORT_WARNING.to_string()]);
    }

    #[test]
    fn test_lossless_stops_at_first_fit() {
        let codec = MockCodec::new().decoding(100, 100, ColorMode::Rgba, Some(ImageFormat::Png));
        let request = CompressionRequest::new(15_000).with_format(RequestedFormat::Png);
        let result = run(&codec, 30_000, &request);

        assert_eq!((result.width, result.height), (80, 80));
        assert_eq!(codec.encodes(), 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_lossless_over_budget_keeps_smallest_with_warning() {
        let codec = MockCodec::new().decoding(100, 100, ColorMode::Rgba, Some(ImageFormat::Png));
        let request = CompressionRequest::new(1_000).with_format(RequestedFormat::Png);
        let result = run(&codec, 30_000, &request);

        assert_eq!((result.width, result.height), (50, 50));
        assert_eq!(result.size_bytes, 5_064);
        assert_eq!(
            result.warnings,
            vec!["Could not reach exact target. Output is 5064 bytes (target was 1000).".to_string()]
        );
    }

    #[test]
    fn test_transparent_png_keeps_format_with_warning() {
        let codec = MockCodec::new().decoding(100, 100, ColorMode::Rgba, Some(ImageFormat::Png));
        let result = run(&codec, 40_000, &CompressionRequest::new(35_000));

        assert_eq!(result.format, OutputFormat::Png);
        assert_eq!(result.warnings, vec![crate::format::TRANSPARENT_PNG_KEPT.to_string()]);
    }

    #[test]
    fn test_max_dim_resizes_even_at_full_scale() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(2_000).with_max_dim(50);
        let result = run(&codec, 3_000, &request);

        assert_eq!(codec.resizes().first(), Some(&(50, 50)));
        assert!(result.width <= 50 && result.height <= 50);
    }

    #[test]
    fn test_manual_quality_used_for_every_probe() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(3_000).with_quality(QualityMode::Manual(60));
        let result = run(&codec, 5_000, &request);

        assert!(result.size_bytes <= 3_000);
        assert!(codec.ops().iter().all(|op| match op {
            Op::Encode { quality, .. } => *quality == 60,
            _ => true,
        }));
    }

    #[test]
    fn test_strip_flag_reaches_codec() {
        let codec = MockCodec::new();
        let request = CompressionRequest::new(9_700).with_strip_exif(true);
        run(&codec, 15_000, &request);
        assert!(codec.ops().iter().all(|op| match op {
            Op::Encode { strip, .. } => *strip,
            _ => true,
        }));
    }

    #[test]
    fn test_search_is_deterministic() {
        let request = CompressionRequest::new(3_000);
        let first = run(&MockCodec::new(), 5_000, &request);
        let second = run(&MockCodec::new(), 5_000, &request);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_failure_is_not_retried() {
        let codec = MockCodec::new();
        let err = compress_to_target(&codec, &[], &CompressionRequest::new(10), &SearchConfig::default()).unwrap_err();
        assert!(matches!(err, CompressionError::Decode(_)));
        assert_eq!(codec.ops(), vec![Op::Decode]);
    }
}
