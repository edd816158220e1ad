//! End-to-end searches against the production codec on generated images.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use imgfit_compression::{
    compress, compress_to_target, estimate, search_quality, CompressionError, CompressionRequest,
    QualityMode, SearchParams, BEST_EFFORT_WARNING, TRANSPARENT_PNG_KEPT,
};
use imgfit_core::config::SearchConfig;
use imgfit_image::{extract_exif, ColorMode, ImageCodec, ImageRsCodec, OutputFormat, Quality};
use std::io::Cursor;

fn codec() -> ImageRsCodec {
    ImageRsCodec::new().with_webp_method(4)
}

fn noise(x: u32, y: u32) -> u8 {
    (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)).wrapping_mul(2_654_435_761) as u8 >> 2
}

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 200 / width) as u8 + noise(x, y) / 2,
            (y * 200 / height) as u8 + noise(y, x) / 2,
            ((x + y) % 128) as u8 + noise(x + 1, y) / 2,
        ])
    }))
}

fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn photo_jpeg() -> Vec<u8> {
    encode(&photo(320, 240), ImageOutputFormat::Jpeg(95))
}

fn with_exif(jpeg: &[u8], exif: &[u8]) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + exif.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn aggressive_budget_is_met_with_webp() {
    let data = photo_jpeg();
    let target = data.len() as u64 * 4 / 10;

    let result = compress(&codec(), &data, &CompressionRequest::new(target), &SearchConfig::default()).unwrap();

    assert_eq!(result.format, OutputFormat::WebP);
    assert!(result.size_bytes <= target, "{} > {}", result.size_bytes, target);
    assert!(!result.warnings.iter().any(|w| w == BEST_EFFORT_WARNING));

    let decoded = image::load_from_memory(&result.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (result.width, result.height));
}

#[test]
fn mild_budget_keeps_jpeg() {
    let data = photo_jpeg();
    let target = data.len() as u64 * 7 / 10;

    let result = compress(&codec(), &data, &CompressionRequest::new(target), &SearchConfig::default()).unwrap();

    assert_eq!(result.format, OutputFormat::Jpeg);
    assert!(result.size_bytes <= target);
    assert!(result.data.starts_with(&[0xFF, 0xD8]));
    assert_eq!(result.mime_type(), "image/jpeg");
}

#[test]
fn same_request_gives_identical_bytes() {
    let data = photo_jpeg();
    let request = CompressionRequest::new(data.len() as u64 / 2);
    let config = SearchConfig::default();

    let first = compress(&codec(), &data, &request, &config).unwrap();
    let second = compress(&codec(), &data, &request, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn estimate_reports_what_compress_produces() {
    let data = photo_jpeg();
    let request = CompressionRequest::new(data.len() as u64 / 2);
    let config = SearchConfig::default();

    let compressed = compress(&codec(), &data, &request, &config).unwrap();
    let estimated = estimate(&codec(), &data, &request, &config).unwrap();
    assert_eq!(estimated.estimated_size_bytes, compressed.size_bytes);
    assert_eq!(estimated.chosen_format, compressed.format);
}

#[test]
fn input_within_budget_passes_through() {
    let data = photo_jpeg();
    let request = CompressionRequest::new(data.len() as u64);

    let result = compress_to_target(&codec(), &data, &request, &SearchConfig::default()).unwrap();
    assert_eq!(result.data, data);
    assert_eq!((result.width, result.height), (320, 240));
}

#[test]
fn unreachable_budget_falls_back_once() {
    let data = photo_jpeg();
    let request = CompressionRequest::new(10);

    let result = compress_to_target(&codec(), &data, &request, &SearchConfig::default()).unwrap();
    assert_eq!((result.width, result.height), (160, 120));
    assert_eq!(result.warnings.iter().filter(|w| *w == BEST_EFFORT_WARNING).count(), 1);
}

#[test]
fn accepted_quality_is_bracketed_by_the_budget() {
    let codec = codec();
    let image = codec.decode(&photo_jpeg()).unwrap();
    let config = SearchConfig::default();
    let target = codec.encode(&image, OutputFormat::Jpeg, Quality::new(70), true).unwrap().len() as u64;

    let params = SearchParams {
        format: OutputFormat::Jpeg,
        target_bytes: target,
        mode: QualityMode::Auto,
        strip_metadata: true,
        config: &config,
    };
    let best = search_quality(&codec, &image, params).unwrap().unwrap();
    let quality = best.quality.unwrap().value();

    assert!(best.size() <= target);
    if quality < config.quality_ceiling {
        let above = codec.encode(&image, OutputFormat::Jpeg, Quality::new(quality + 1), true).unwrap();
        assert!(above.len() as u64 > target, "quality {} also fits", quality + 1);
    }
}

#[test]
fn transparent_png_stays_png() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(96, 96, |x, y| {
        Rgba([noise(x, y), (x * 2) as u8, (y * 2) as u8, (x + y) as u8])
    }));
    let data = encode(&img, ImageOutputFormat::Png);
    let target = data.len() as u64 * 9 / 10;

    let result = compress(&codec(), &data, &CompressionRequest::new(target), &SearchConfig::default()).unwrap();

    assert_eq!(result.format, OutputFormat::Png);
    assert_eq!(result.warnings.first().map(String::as_str), Some(TRANSPARENT_PNG_KEPT));
    let decoded = image::load_from_memory(&result.data).unwrap();
    assert!(decoded.color().has_alpha());
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// Splice a `tRNS` chunk in right after IHDR.
fn with_trns(png: &[u8], body: &[u8]) -> Vec<u8> {
    let ihdr_end = 8 + 4 + 4 + 13 + 4;
    let mut chunk = Vec::new();
    chunk.extend_from_slice(&(body.len() as u32).to_be_bytes());
    let mut typed = b"tRNS".to_vec();
    typed.extend_from_slice(body);
    chunk.extend_from_slice(&typed);
    chunk.extend_from_slice(&crc32(&typed).to_be_bytes());

    let mut out = png[..ihdr_end].to_vec();
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&png[ihdr_end..]);
    out
}

#[test]
fn truecolor_png_with_color_key_is_treated_as_opaque() {
    // Key on white, which the generated photo never contains.
    let data = with_trns(&encode(&photo(96, 96), ImageOutputFormat::Png), &[0, 255, 0, 255, 0, 255]);
    assert_eq!(codec().decode(&data).unwrap().color, ColorMode::Rgb);

    let target = data.len() as u64 * 9 / 10;
    let result = compress(&codec(), &data, &CompressionRequest::new(target), &SearchConfig::default()).unwrap();

    assert_eq!(result.format, OutputFormat::WebP);
    assert!(result.size_bytes <= target);
    assert!(!result.warnings.iter().any(|w| w == TRANSPARENT_PNG_KEPT));
}

#[test]
fn exif_survives_into_jpeg_unless_stripped() {
    let data = with_exif(&photo_jpeg(), b"MM\0*camera-tags");
    let target = data.len() as u64 * 7 / 10;
    let config = SearchConfig::default();

    let kept = compress(&codec(), &data, &CompressionRequest::new(target), &config).unwrap();
    assert_eq!(kept.format, OutputFormat::Jpeg);
    assert_eq!(extract_exif(&kept.data).as_deref(), Some(&b"MM\0*camera-tags"[..]));

    let request = CompressionRequest::new(target).with_strip_exif(true);
    let stripped = compress(&codec(), &data, &request, &config).unwrap();
    assert!(extract_exif(&stripped.data).is_none());
}

#[test]
fn low_manual_quality_rejected_before_decode() {
    let request = CompressionRequest::new(100).with_quality(QualityMode::Manual(10));
    let err = compress(&codec(), b"not an image at all, but long enough", &request, &SearchConfig::default())
        .unwrap_err();
    assert!(matches!(err, CompressionError::InvalidInput(_)));
}
