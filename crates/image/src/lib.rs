//! Image codec adapter for imgfit.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Header-only inspection (dimensions, color layout, EXIF presence)
//! - The [`ImageCodec`] trait the size-targeting search is written against
//! - [`ImageRsCodec`], the production codec (decode, Lanczos3 resize,
//!   JPEG/PNG/WebP encode, metadata stripping)
//! - Alpha flattening for three-channel output

#![warn(missing_docs)]

mod codec;
mod detect;
mod error;
mod metadata;

#[cfg(feature = "processing")]
mod alpha;
#[cfg(feature = "processing")]
mod encode;
#[cfg(feature = "processing")]
mod resize;
#[cfg(feature = "processing")]
mod rust_codec;

pub use codec::{ColorMode, ImageCodec, ImageDescriptor, OutputFormat, Quality};
pub use detect::{detect_format, ImageFormat};
pub use error::{CodecError, ImageError, Result};
pub use metadata::{extract_exif, inspect, ImageInfo};

#[cfg(feature = "processing")]
pub use alpha::{flatten_alpha, has_alpha_channel};
#[cfg(feature = "processing")]
pub use resize::resample;
#[cfg(feature = "processing")]
pub use rust_codec::{ImageRsCodec, DEFAULT_WEBP_METHOD};
