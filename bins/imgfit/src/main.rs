//! imgfit: re-encode images so they fit a byte budget.

use clap::{Parser, Subcommand};
use imgfit_cli::output::{print_error, Status};
use imgfit_core::config::Config;
use imgfit_core::{exit_codes, Error};
use imgfit_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::RequestArgs;

#[derive(Parser)]
#[command(name = "imgfit")]
#[command(about = "Re-encode images to fit a byte budget")]
#[command(version)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show format, dimensions and metadata read from the image headers
    Inspect {
        /// Path to image file
        path: PathBuf,
    },
    /// Report what compressing to the target would produce
    Estimate {
        /// Path to image file
        path: PathBuf,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Compress an image to the target and write the result
    Compress {
        /// Path to image file
        path: PathBuf,

        /// Output path (defaults to `{stem}_compressed_{size}MB.{ext}` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        request: RequestArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&err, json),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.schema.logging.level.clone()
    };
    imgfit_telemetry::init_with_config(TelemetryConfig::new(level, config.schema.logging.json))
        .map_err(|e| Error::config_invalid(e.to_string()))?;

    tracing::debug!(config = ?config.path, "configuration loaded");

    match cli.command {
        Commands::Inspect { path } => commands::inspect(&path, cli.json),
        Commands::Estimate { path, request } => commands::estimate(&path, &request, &config, cli.json),
        Commands::Compress {
            path,
            output,
            request,
        } => commands::compress(&path, output, &request, &config, cli.json),
    }
}

/// Render the failure and pick the process exit code.
fn report_failure(err: &anyhow::Error, json: bool) -> ExitCode {
    let Some(err) = err.downcast_ref::<Error>() else {
        Status::error(&format!("{err:#}"));
        return exit_code(exit_codes::FAILURE);
    };

    let rendered = json
        .then(|| serde_json::to_string_pretty(&err.to_report()).ok())
        .flatten();
    match rendered {
        Some(report) => println!("{report}"),
        None => print_error(err),
    }
    exit_code(err.exit_code())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
