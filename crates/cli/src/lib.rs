//! CLI utilities for imgfit
//!
//! Provides shared CLI functionality:
//! - Status messages and coded error rendering
//! - Size formatting and parsing
//! - Progress spinners

#![warn(missing_docs)]

pub mod output;
pub mod progress;
