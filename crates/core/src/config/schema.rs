//! Configuration schema definitions
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. The search defaults reproduce the classic ladder: qualities
//! 40-95, ten probes, scales 1.0 down to 0.5.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigSchema {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.encoding.validate()
    }
}

/// Size-targeting search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Lowest quality the binary search probes, also the manual minimum
    pub quality_floor: u8,

    /// Highest quality the binary search probes
    pub quality_ceiling: u8,

    /// Binary search probes per scale
    pub max_probes: u32,

    /// Resize scales tried under the target-size priority, largest first
    pub scales: Vec<f64>,

    /// Stop once the best result is this close to the target (fraction)
    pub close_enough_ratio: f64,

    /// Below this target/original ratio WebP is chosen automatically
    pub aggressive_ratio: f64,

    /// Scale of the best-effort fallback encode
    pub fallback_scale: f64,

    /// Quality of the best-effort fallback encode
    pub fallback_quality: u8,

    /// Setting passed for lossless output (which has no quality knob)
    pub lossless_quality: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quality_floor: 40,
            quality_ceiling: 95,
            max_probes: 10,
            scales: default_scales(),
            close_enough_ratio: 0.05,
            aggressive_ratio: 0.5,
            fallback_scale: 0.5,
            fallback_quality: 40,
            lossless_quality: 95,
        }
    }
}

fn default_scales() -> Vec<f64> {
    vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5]
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

impl SearchConfig {
    /// Reject settings the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("quality_floor", self.quality_floor),
            ("quality_ceiling", self.quality_ceiling),
            ("fallback_quality", self.fallback_quality),
            ("lossless_quality", self.lossless_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(Error::config_invalid(format!(
                    "search.{name} must be 1-100, got {value}"
                )));
            }
        }
        if self.quality_floor > self.quality_ceiling {
            return Err(Error::config_invalid(format!(
                "search.quality_floor ({}) must not exceed search.quality_ceiling ({})",
                self.quality_floor, self.quality_ceiling
            )));
        }
        if self.max_probes == 0 {
            return Err(Error::config_invalid("search.max_probes must be at least 1"));
        }
        if self.scales.is_empty() {
            return Err(Error::config_invalid("search.scales must not be empty"));
        }
        if let Some(bad) = self.scales.iter().find(|s| !in_unit_interval(**s)) {
            return Err(Error::config_invalid(format!(
                "search.scales entries must be in (0, 1], got {bad}"
            )));
        }
        for (name, value) in [
            ("fallback_scale", self.fallback_scale),
            ("aggressive_ratio", self.aggressive_ratio),
        ] {
            if !in_unit_interval(value) {
                return Err(Error::config_invalid(format!(
                    "search.{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.close_enough_ratio) {
            return Err(Error::config_invalid(format!(
                "search.close_enough_ratio must be in [0, 1), got {}",
                self.close_enough_ratio
            )));
        }
        Ok(())
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// libwebp effort, 0 (fast) to 6 (smallest)
    pub webp_method: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { webp_method: 6 }
    }
}

impl EncodingConfig {
    /// Reject out-of-range encoder settings.
    pub fn validate(&self) -> Result<()> {
        if self.webp_method > 6 {
            return Err(Error::config_invalid(format!(
                "encoding.webp_method must be 0-6, got {}",
                self.webp_method
            )));
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
