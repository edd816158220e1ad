//! A codec that only models output sizes, for search tests.
//!
//! Lossy sizes grow strictly with quality and pixel count; lossless sizes
//! depend on pixel count alone. Every call is recorded.

use imgfit_image::{CodecError, ColorMode, ImageCodec, ImageDescriptor, ImageFormat, OutputFormat, Quality};
use std::sync::Mutex;

const HEADER: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Decode,
    Resize { width: u32, height: u32 },
    Encode { format: OutputFormat, quality: u8, strip: bool, width: u32, height: u32 },
}

/// When metadata encoding fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFailure {
    Never,
    /// Fails whenever EXIF is present and not stripped
    UnlessStripped,
    /// Fails for every output except stripped JPEG
    UnlessStrippedJpeg,
    Always,
}

pub struct MockCodec {
    width: u32,
    height: u32,
    color: ColorMode,
    source: Option<ImageFormat>,
    exif: Option<Vec<u8>>,
    metadata: MetadataFailure,
    ops: Mutex<Vec<Op>>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self {
            width: 100,
            height: 100,
            color: ColorMode::Rgb,
            source: Some(ImageFormat::Jpeg),
            exif: None,
            metadata: MetadataFailure::Never,
            ops: Mutex::new(Vec::new()),
        }
    }

    /// What `decode` reports, whatever the bytes.
    pub fn decoding(mut self, width: u32, height: u32, color: ColorMode, source: Option<ImageFormat>) -> Self {
        self.width = width;
        self.height = height;
        self.color = color;
        self.source = source;
        self
    }

    pub fn with_exif(mut self, exif: &[u8]) -> Self {
        self.exif = Some(exif.to_vec());
        self
    }

    pub fn failing_metadata(self) -> Self {
        self.metadata_failure(MetadataFailure::UnlessStripped)
    }

    pub fn metadata_failure(mut self, mode: MetadataFailure) -> Self {
        self.metadata = mode;
        self
    }

    pub fn image(&self, width: u32, height: u32) -> ImageDescriptor<()> {
        ImageDescriptor {
            width,
            height,
            color: self.color,
            source_format: self.source,
            exif: None,
            pixels: (),
        }
    }

    pub fn size_at(&self, image: &ImageDescriptor<()>, format: OutputFormat, quality: u8) -> u64 {
        model_size(image.width, image.height, format, quality)
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn encodes(&self) -> usize {
        self.ops().iter().filter(|op| matches!(op, Op::Encode { .. })).count()
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Resize { width, height } => Some((width, height)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }
}

/// Size the mock produces for an encode.
pub fn model_size(width: u32, height: u32, format: OutputFormat, quality: u8) -> u64 {
    let pixels = u64::from(width) * u64::from(height);
    let q = u64::from(quality);
    match format {
        OutputFormat::Jpeg => HEADER + q + pixels * q / 100,
        OutputFormat::WebP => HEADER + q + pixels * q / 200,
        OutputFormat::Png => HEADER + pixels * 2,
    }
}

impl ImageCodec for MockCodec {
    type Pixels = ();

    fn decode(&self, data: &[u8]) -> Result<ImageDescriptor<()>, CodecError> {
        self.record(Op::Decode);
        if data.is_empty() {
            return Err(CodecError::Decode("no data".into()));
        }
        let mut image = self.image(self.width, self.height);
        image.exif = self.exif.clone();
        Ok(image)
    }

    fn resize(&self, image: &ImageDescriptor<()>, width: u32, height: u32) -> ImageDescriptor<()> {
        self.record(Op::Resize { width, height });
        image.with_pixels(width, height, ())
    }

    fn encode(
        &self,
        image: &ImageDescriptor<()>,
        format: OutputFormat,
        quality: Quality,
        strip_metadata: bool,
    ) -> Result<Vec<u8>, CodecError> {
        self.record(Op::Encode {
            format,
            quality: quality.value(),
            strip: strip_metadata,
            width: image.width,
            height: image.height,
        });

        let fails = match self.metadata {
            MetadataFailure::Never => false,
            MetadataFailure::UnlessStripped => image.exif.is_some() && !strip_metadata,
            MetadataFailure::UnlessStrippedJpeg => !(strip_metadata && format == OutputFormat::Jpeg),
            MetadataFailure::Always => true,
        };
        if fails {
            return Err(CodecError::Metadata("mock metadata failure".into()));
        }

        let size = model_size(image.width, image.height, format, quality.value());
        Ok(vec![0; size as usize])
    }
}
