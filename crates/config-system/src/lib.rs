//! Configuration system for the cross-filtering pipeline
//! Query limits, debounce timing, retry policy and transform display policy

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod hot_reload;
pub mod parser;
pub mod validation;

pub use hot_reload::ConfigHandle;
pub use parser::{ConfigFormat, ConfigParser, ConfigSerializer};
pub use validation::ConfigValidator;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crossfilter_shared::PipelineError {
    fn from(err: ConfigError) -> Self {
        crossfilter_shared::PipelineError::InvalidConfig {
            message: err.to_string(),
            field: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: String,
    pub query: QueryConfig,
    pub pipeline: TimingConfig,
    pub retry: RetryConfig,
    pub transforms: TransformConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            query: QueryConfig::default(),
            pipeline: TimingConfig::default(),
            retry: RetryConfig::default(),
            transforms: TransformConfig::default(),
        }
    }
}

/// Remote query settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// URL the aggregation requests are posted to
    pub endpoint: String,
    /// Row ceiling used when a chart does not limit its result
    pub row_limit: u64,
    pub timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/query".to_string(),
            row_limit: 5000,
            timeout_ms: 30_000,
        }
    }
}

/// Activation timing for widget pipelines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Debounce window for reactive dashboard widgets
    pub debounce_ms: u64,
    /// Delay before a manually triggered fetch
    pub manual_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            manual_delay_ms: 0,
        }
    }
}

/// Bounded retry with exponential backoff for remote fetches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 2_000,
        }
    }
}

/// How detected outliers are presented
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutlierDisplay {
    /// Keep every row in the series and list outliers as an overlay
    #[default]
    Highlight,
    /// Drop outliers from the series; they are still reported separately
    Exclude,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TransformConfig {
    pub outlier_display: OutlierDisplay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.query.row_limit, 5000);
        assert_eq!(config.pipeline.debounce_ms, 500);
        assert_eq!(config.pipeline.manual_delay_ms, 0);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.transforms.outlier_display, OutlierDisplay::Highlight);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"pipeline": {"debounce_ms": 250}}"#).unwrap();
        assert_eq!(config.pipeline.debounce_ms, 250);
        assert_eq!(config.pipeline.manual_delay_ms, 0);
        assert_eq!(config.query, QueryConfig::default());
    }

    #[test]
    fn test_outlier_display_parses() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"transforms": {"outlier_display": "exclude"}}"#).unwrap();
        assert_eq!(config.transforms.outlier_display, OutlierDisplay::Exclude);
    }

    #[test]
    fn test_config_error_maps_to_pipeline_error() {
        let err: crossfilter_shared::PipelineError =
            ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(
            err,
            crossfilter_shared::PipelineError::InvalidConfig { .. }
        ));
    }
}
