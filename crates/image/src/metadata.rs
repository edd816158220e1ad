//! Header-only inspection: dimensions, color layout and EXIF presence
//! without decoding any pixels.

use crate::{detect_format, ColorMode, ImageError, ImageFormat, Result};
use serde::{Deserialize, Serialize};

const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// What the container headers say about an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Detected container
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color layout, when the header exposes it
    pub color: Option<ColorMode>,
    /// Whether an EXIF block is embedded
    pub has_exif: bool,
    /// Size of the input in bytes
    pub size_bytes: usize,
}

impl ImageInfo {
    /// Calculate aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// True when the header reports an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.color.is_some_and(|c| c.has_alpha_channel())
    }
}

/// Inspect container headers.
///
/// JPEG, PNG, GIF and WebP headers are parsed; any other recognised
/// container is reported as [`ImageError::InvalidData`] because its
/// dimensions need a full decoder.
pub fn inspect(data: &[u8]) -> Result<ImageInfo> {
    let format = detect_format(data)?;

    let (width, height, color) = match format {
        ImageFormat::Jpeg => jpeg_header(data),
        ImageFormat::Png => png_header(data),
        ImageFormat::Gif => gif_header(data),
        ImageFormat::WebP => webp_header(data),
        other => {
            return Err(ImageError::InvalidData(format!(
                "{} headers cannot be inspected",
                other.name()
            )));
        }
    }
    .ok_or_else(|| ImageError::InvalidData(format!("Truncated {} header", format.name())))?;

    Ok(ImageInfo {
        format,
        width,
        height,
        color,
        has_exif: extract_exif(data).is_some(),
        size_bytes: data.len(),
    })
}

/// Pull the raw EXIF payload (starting at the TIFF header) out of a JPEG
/// APP1 segment, a PNG `eXIf` chunk or a WebP `EXIF` chunk.
pub fn extract_exif(data: &[u8]) -> Option<Vec<u8>> {
    match detect_format(data).ok()? {
        ImageFormat::Jpeg => jpeg_segments(data)
            .find(|(marker, payload)| *marker == 0xE1 && payload.starts_with(EXIF_PREFIX))
            .map(|(_, payload)| payload[EXIF_PREFIX.len()..].to_vec()),
        ImageFormat::Png => png_chunks(data)
            .find(|(kind, _)| kind == b"eXIf")
            .map(|(_, body)| body.to_vec()),
        ImageFormat::WebP => riff_chunks(data)
            .find(|(kind, _)| kind == b"EXIF")
            .map(|(_, body)| body.strip_prefix(EXIF_PREFIX).unwrap_or(body).to_vec()),
        _ => None,
    }
}

/// Walk JPEG marker segments up to the start of scan.
fn jpeg_segments(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 2;
    std::iter::from_fn(move || {
        while i + 4 <= data.len() {
            if data[i] != 0xFF {
                i += 1;
                continue;
            }
            let marker = data[i + 1];
            if marker == 0xFF {
                i += 1;
                continue;
            }
            if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
                i += 2;
                continue;
            }
            if marker == 0xD9 || marker == 0xDA {
                return None;
            }
            let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            let start = i + 4;
            let end = (i + 2 + length).min(data.len());
            i += 2 + length;
            if length < 2 || start > end {
                return None;
            }
            return Some((marker, &data[start..end]));
        }
        None
    })
}

/// Walk PNG chunks after the signature.
fn png_chunks(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut i = 8;
    std::iter::from_fn(move || {
        if i + 8 > data.len() {
            return None;
        }
        let length = u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]) as usize;
        let kind = [data[i + 4], data[i + 5], data[i + 6], data[i + 7]];
        let start = i + 8;
        let end = start.checked_add(length)?;
        if end > data.len() {
            return None;
        }
        // length + type + body + crc
        i = end + 4;
        Some((kind, &data[start..end]))
    })
}

/// Walk RIFF sub-chunks of a WebP file.
fn riff_chunks(data: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut i = 12;
    std::iter::from_fn(move || {
        if i + 8 > data.len() {
            return None;
        }
        let kind = [data[i], data[i + 1], data[i + 2], data[i + 3]];
        let length = u32::from_le_bytes([data[i + 4], data[i + 5], data[i + 6], data[i + 7]]) as usize;
        let start = i + 8;
        let end = start.checked_add(length)?.min(data.len());
        // chunks are padded to even sizes
        i = start + length + (length & 1);
        Some((kind, &data[start..end]))
    })
}

type Header = (u32, u32, Option<ColorMode>);

fn jpeg_header(data: &[u8]) -> Option<Header> {
    jpeg_segments(data)
        .find(|(marker, _)| {
            matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
        })
        .and_then(|(_, sof)| {
            // precision, height, width, component count
            if sof.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([sof[1], sof[2]]) as u32;
            let width = u16::from_be_bytes([sof[3], sof[4]]) as u32;
            let color = match sof[5] {
                1 => ColorMode::Grayscale,
                _ => ColorMode::Rgb,
            };
            Some((width, height, Some(color)))
        })
}

fn png_header(data: &[u8]) -> Option<Header> {
    let (kind, ihdr) = png_chunks(data).next()?;
    if &kind != b"IHDR" || ihdr.len() < 13 {
        return None;
    }
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    let color = match ihdr[9] {
        0 => Some(ColorMode::Grayscale),
        2 => Some(ColorMode::Rgb),
        3 => Some(ColorMode::Palette {
            transparency: png_chunks(data).any(|(kind, _)| &kind == b"tRNS"),
        }),
        4 => Some(ColorMode::GrayscaleAlpha),
        6 => Some(ColorMode::Rgba),
        _ => None,
    };
    Some((width, height, color))
}

fn gif_header(data: &[u8]) -> Option<Header> {
    if data.len() < 13 {
        return None;
    }
    let width = u16::from_le_bytes([data[6], data[7]]) as u32;
    let height = u16::from_le_bytes([data[8], data[9]]) as u32;
    let transparency = gif_first_frame_transparent(data);
    Some((width, height, Some(ColorMode::Palette { transparency })))
}

/// Walk the blocks ahead of the first image descriptor looking for a graphic
/// control extension with the transparent-index bit set.
fn gif_first_frame_transparent(data: &[u8]) -> bool {
    let packed = data[10];
    let mut pos = 13;
    if packed & 0x80 != 0 {
        pos += 3 * (1usize << ((packed & 0x07) + 1));
    }

    while let Some(&introducer) = data.get(pos) {
        if introducer != 0x21 {
            // image descriptor (0x2C), trailer (0x3B) or garbage
            return false;
        }
        let Some(&label) = data.get(pos + 1) else {
            return false;
        };
        if label == 0xF9 && data.get(pos + 2) == Some(&0x04) {
            return data.get(pos + 3).is_some_and(|flags| flags & 0x01 == 1);
        }
        // skip the extension's data sub-blocks
        pos += 2;
        loop {
            let Some(&size) = data.get(pos) else {
                return false;
            };
            pos += 1 + size as usize;
            if size == 0 {
                break;
            }
        }
    }
    false
}

fn webp_header(data: &[u8]) -> Option<Header> {
    let (kind, body) = riff_chunks(data).next()?;
    match &kind {
        b"VP8 " => {
            // 3-byte frame tag, 3-byte start code, then 14-bit dimensions
            if body.len() < 10 || body[3..6] != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let width = u16::from_le_bytes([body[6], body[7]]) as u32 & 0x3FFF;
            let height = u16::from_le_bytes([body[8], body[9]]) as u32 & 0x3FFF;
            Some((width, height, Some(ColorMode::Rgb)))
        }
        b"VP8L" => {
            if body.len() < 5 || body[0] != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes([body[1], body[2], body[3], body[4]]);
            let width = (bits & 0x3FFF) + 1;
            let height = ((bits >> 14) & 0x3FFF) + 1;
            let alpha = (bits >> 28) & 1 == 1;
            let color = if alpha { ColorMode::Rgba } else { ColorMode::Rgb };
            Some((width, height, Some(color)))
        }
        b"VP8X" => {
            if body.len() < 10 {
                return None;
            }
            let alpha = body[0] & 0x10 != 0;
            let width = u32::from_le_bytes([body[4], body[5], body[6], 0]) + 1;
            let height = u32::from_le_bytes([body[7], body[8], body[9], 0]) + 1;
            let color = if alpha { ColorMode::Rgba } else { ColorMode::Rgb };
            Some((width, height, Some(color)))
        }
        _ => None,
    }
}
