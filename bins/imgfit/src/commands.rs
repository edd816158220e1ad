//! Subcommand handlers

use clap::Args;
use imgfit_cli::output::{format_duration, format_ratio, format_size, parse_size, Status};
use imgfit_cli::progress;
use imgfit_compression::{Compressed, CompressionRequest, Priority, QualityMode, RequestedFormat};
use imgfit_core::config::Config;
use imgfit_core::{Error, ResultExt};
use imgfit_image::{inspect as inspect_headers, ColorMode, ImageRsCodec};
use imgfit_telemetry::Timer;
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Budget and encoder options shared by `estimate` and `compress`
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Byte budget, e.g. 500000, 350KB or 1.5MB
    #[arg(short, long, value_parser = parse_size)]
    target: u64,

    /// Output format: auto, jpeg, png or webp
    #[arg(short, long, default_value = "auto")]
    format: RequestedFormat,

    /// Cap on the longer edge in pixels
    #[arg(long)]
    max_dim: Option<u32>,

    /// Encode at this quality instead of searching
    #[arg(short, long)]
    quality: Option<u8>,

    /// target_size or optimal_resolution
    #[arg(short, long, default_value = "target_size")]
    priority: Priority,

    /// Drop EXIF metadata from the output
    #[arg(long)]
    strip_exif: bool,
}

impl RequestArgs {
    fn to_request(&self) -> CompressionRequest {
        let mut request = CompressionRequest::new(self.target)
            .with_format(self.format)
            .with_priority(self.priority)
            .with_strip_exif(self.strip_exif);
        if let Some(max_dim) = self.max_dim {
            request = request.with_max_dim(max_dim);
        }
        if let Some(quality) = self.quality {
            request = request.with_quality(QualityMode::Manual(quality));
        }
        request
    }
}

#[derive(Serialize)]
struct CompressReport<'a> {
    input: String,
    output: String,
    original_bytes: u64,
    mime_type: &'static str,
    #[serde(flatten)]
    result: &'a Compressed,
}

pub fn inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let data = read_input(path)?;
    let info = inspect_headers(&data).map_err(|e| {
        Error::decode_failed(e.to_string())
            .with_context(format!("Inspecting {}", path.display()))
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    Status::header(&path.display().to_string());
    Status::field("Format", info.format.name());
    Status::field("Dimensions", format!("{}x{}", info.width, info.height));
    Status::field("Aspect ratio", format!("{:.2}", info.aspect_ratio()));
    Status::field("Color", describe_color(info.color));
    Status::field("EXIF", if info.has_exif { "present" } else { "none" });
    Status::field("Size", format_size(info.size_bytes as u64));
    Ok(())
}

pub fn estimate(path: &Path, args: &RequestArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let data = read_input(path)?;
    let request = args.to_request();
    let codec = codec_for(config);

    let pb = spinner_for(json, "Estimating...");
    let timer = Timer::start("estimate");
    let outcome = imgfit_compression::estimate(&codec, &data, &request, &config.schema.search);
    let elapsed = timer.stop();

    let estimate = match outcome {
        Ok(estimate) => {
            progress::finish_success(&pb, "Search complete");
            estimate
        }
        Err(e) => {
            progress::finish_error(&pb);
            return Err(Error::from(e)
                .with_context(format!("Estimating {}", path.display()))
                .into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    Status::header(&path.display().to_string());
    Status::field("Format", estimate.chosen_format);
    Status::field(
        "Dimensions",
        format!("{}x{}", estimate.predicted_width, estimate.predicted_height),
    );
    Status::field(
        "Size",
        format!(
            "{} ({} of original)",
            format_size(estimate.estimated_size_bytes),
            format_ratio(estimate.estimated_size_bytes, data.len() as u64)
        ),
    );
    Status::field("Target", format_size(args.target));
    Status::field("Time", format_duration(elapsed));
    print_warnings(&estimate.warnings);
    Ok(())
}

pub fn compress(
    path: &Path,
    output: Option<PathBuf>,
    args: &RequestArgs,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let data = read_input(path)?;
    let request = args.to_request();
    let codec = codec_for(config);

    let pb = spinner_for(json, "Compressing...");
    let timer = Timer::start("compress");
    let outcome = imgfit_compression::compress(&codec, &data, &request, &config.schema.search);
    let elapsed = timer.stop();

    let result = match outcome {
        Ok(result) => {
            progress::finish_success(&pb, "Search complete");
            result
        }
        Err(e) => {
            progress::finish_error(&pb);
            return Err(Error::from(e)
                .with_context(format!("Compressing {}", path.display()))
                .into());
        }
    };

    let output = output.unwrap_or_else(|| default_output(path, &result));
    std::fs::write(&output, &result.data)
        .map_err(Error::from)
        .context(format!("Failed to write {}", output.display()))?;
    info!(output = %output.display(), size = result.size_bytes, format = %result.format, "wrote compressed image");

    if json {
        let report = CompressReport {
            input: path.display().to_string(),
            output: output.display().to_string(),
            original_bytes: data.len() as u64,
            mime_type: result.mime_type(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Status::success(&format!("Wrote {}", output.display()));
    Status::field("Format", result.format);
    Status::field("Dimensions", format!("{}x{}", result.width, result.height));
    Status::field(
        "Size",
        format!(
            "{} ({} of original)",
            format_size(result.size_bytes),
            format_ratio(result.size_bytes, data.len() as u64)
        ),
    );
    Status::field("Target", format_size(args.target));
    Status::field("Time", format_duration(elapsed));
    print_warnings(&result.warnings);
    Ok(())
}

fn read_input(path: &Path) -> imgfit_core::Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    std::fs::read(path)
        .map_err(Error::from)
        .context(format!("Failed to read {}", path.display()))
}

fn codec_for(config: &Config) -> ImageRsCodec {
    ImageRsCodec::new().with_webp_method(config.schema.encoding.webp_method)
}

fn spinner_for(json: bool, message: &str) -> ProgressBar {
    if json {
        progress::hidden()
    } else {
        progress::spinner(message)
    }
}

/// `{stem}_compressed_{size}MB.{ext}` beside the input.
fn default_output(input: &Path, result: &Compressed) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(result.file_name(&name))
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        Status::warning(warning);
    }
}

fn describe_color(color: Option<ColorMode>) -> &'static str {
    match color {
        Some(ColorMode::Grayscale) => "grayscale",
        Some(ColorMode::GrayscaleAlpha) => "grayscale + alpha",
        Some(ColorMode::Rgb) => "RGB",
        Some(ColorMode::Rgba) => "RGBA",
        Some(ColorMode::Palette { transparency: true }) => "palette + transparency",
        Some(ColorMode::Palette { transparency: false }) => "palette",
        None => "unknown",
    }
}
