//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Build the `AnalysisPlan` of a recording
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{build_plan, ConfigLoader};
//! use contracts::StreamId;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("stream-qc.toml")).unwrap();
//! let plan = build_plan(&config, &[StreamId::from("/front_stereo_camera/left/image_raw")]);
//! println!("drop checks: {}", plan.drop_checks.len());
//! ```

mod parser;
mod plan;
mod validator;

pub use contracts::ValidationConfig;
pub use parser::ConfigFormat;
pub use plan::build_plan;

use contracts::AnalysisError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ValidationConfig, AnalysisError> {
        let format = ConfigFormat::from_path(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load from `path` when given, otherwise the built-in reference configuration.
    pub fn load_or_default(path: Option<&Path>) -> Result<ValidationConfig, AnalysisError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(ValidationConfig::default()),
        }
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ValidationConfig, AnalysisError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already constructed configuration
    pub fn validate(config: &ValidationConfig) -> Result<(), AnalysisError> {
        validator::validate(config)
    }

    /// Serialize ValidationConfig to TOML string
    pub fn to_toml(config: &ValidationConfig) -> Result<String, AnalysisError> {
        toml::to_string_pretty(config)
            .map_err(|e| AnalysisError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ValidationConfig to JSON string
    pub fn to_json(config: &ValidationConfig) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| AnalysisError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, AnalysisError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ValidationConfig, AnalysisError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
