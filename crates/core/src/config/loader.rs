//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::Path;

/// Candidate config files, checked in order relative to the working directory
const CANDIDATES: [&str; 3] = [".imgfit.toml", "imgfit.toml", ".config/imgfit.toml"];

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist. Without one, the first candidate file
    /// found is used, falling back to built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        schema.validate()?;
        Ok(Self { schema, path: None })
    }

    /// Validate the loaded schema
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    CANDIDATES
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load, parse and validate a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {path}"))?;

    let schema: ConfigSchema = toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {path}"))?;

    schema
        .validate()
        .context(format!("Invalid config file {path}"))?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.search.max_probes, 10);
        assert_eq!(config.schema.encoding.webp_method, 6);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some("/nonexistent/imgfit.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nscales = [1.0, 0.75]\n\n[logging]\njson = true").unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.schema.search.scales, vec![1.0, 0.75]);
        assert!(config.schema.logging.json);
        assert_eq!(config.path.as_deref(), file.path().to_str());
    }

    #[test]
    fn test_invalid_file_is_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[encoding]\nwebp_method = 9").unwrap();

        let err = Config::load(file.path().to_str()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[search\nmax_probes = 3").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }
}
