//! Source and run configuration.
//!
//! Everything the binary needs can be read from a single TOML file;
//! each section falls back to its defaults when omitted.

use crate::error::ParameterError;
use crate::estimation::SearchParams;
use crate::prediction::BoundaryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the synthetic frame source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Seed for the texture and noise generators.
    pub seed: u64,
    /// Horizontal texture displacement per frame.
    pub pan_x: i32,
    /// Vertical texture displacement per frame.
    pub pan_y: i32,
    /// Maximum per-sample noise amplitude (0 disables noise).
    pub noise: u8,
    /// Frames available before capture fails (0 for unlimited).
    pub max_frames: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            seed: 0x5eed,
            pan_x: 3,
            pan_y: -2,
            noise: 0,
            max_frames: 0,
        }
    }
}

impl SourceConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.pan_x.unsigned_abs() >= self.width || self.pan_y.unsigned_abs() >= self.height {
            return Err(ConfigError::InvalidPan {
                pan_x: self.pan_x,
                pan_y: self.pan_y,
            });
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Zero width or height.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Pan at least as large as the frame.
    #[error("pan ({pan_x}, {pan_y}) must be smaller than the frame")]
    InvalidPan {
        /// Horizontal pan.
        pan_x: i32,
        /// Vertical pan.
        pan_y: i32,
    },
    /// Search parameters failed validation.
    #[error("invalid search parameters: {0}")]
    InvalidSearch(#[from] ParameterError),
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Synthetic frame source.
    #[serde(default)]
    pub source: SourceConfig,
    /// Block matching parameters.
    #[serde(default)]
    pub search: SearchParams,
    /// Prediction settings.
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Run length and reporting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Prediction stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PredictionConfig {
    /// How blocks that reach the frame edge are handled.
    pub policy: BoundaryPolicy,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of consecutive frame pairs to process.
    pub pairs: u32,
    /// Print a TOML report for every pair.
    pub report: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pairs: 4,
            report: false,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates every section, including search parameters against the frame size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.search.validate()?;
        self.search
            .check_frame_size(self.source.width, self.source.height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::SearchStrategy;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = SourceConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_pan_larger_than_frame_invalid() {
        let config = SourceConfig {
            pan_x: 400,
            ..SourceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPan { .. })
        ));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FileConfig::from_toml(
            r#"
            [source]
            width = 64
            height = 48

            [search]
            block_size = 8
            search_range = 4
            strategy = "diamond"

            [prediction]
            policy = "reject_at_edge"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.width, 64);
        assert_eq!(config.source.pan_x, SourceConfig::default().pan_x);
        assert_eq!(config.search.block_size, 8);
        assert_eq!(config.search.strategy, SearchStrategy::Diamond);
        assert_eq!(config.prediction.policy, BoundaryPolicy::RejectAtEdge);
        assert_eq!(config.output.pairs, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_block_larger_than_source_rejected() {
        let config = FileConfig::from_toml(
            r#"
            [source]
            width = 10
            height = 10
            pan_x = 1
            pan_y = 1
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSearch(
                ParameterError::BlockExceedsFrame { .. }
            ))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            FileConfig::from_toml("[search]\nblock_size = \"big\""),
            Err(ConfigError::ParseError(_))
        ));
    }
}
