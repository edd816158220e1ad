//! Core utilities for imgfit
//!
//! This crate provides functionality shared by the engine and the binary:
//!
//! - **Error handling**: coded errors with context, recovery suggestions and exit codes
//! - **Configuration**: TOML-based search, encoder and logging settings with validation
//!
//! # Example
//!
//! ```rust,no_run
//! use imgfit_core::config::Config;
//!
//! let config = Config::load(None).expect("valid configuration");
//! println!("probing qualities {}..={}", config.schema.search.quality_floor,
//!     config.schema.search.quality_ceiling);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{exit_codes, Error, ErrorCode, ErrorReport, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, EncodingConfig, LoggingConfig, SearchConfig};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}
