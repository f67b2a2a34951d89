//! Configuration file parser for multiple formats

use crate::{ConfigError, PipelineConfig, Result};
use std::fs;
use std::path::Path;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Configuration parser
pub struct ConfigParser;

impl ConfigParser {
    /// Parse configuration from a file, picking the format from its extension
    pub fn parse_file(path: impl AsRef<Path>) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let format = Self::detect_format(path)?;
        let content = fs::read_to_string(path)?;

        log::info!("Loading pipeline configuration from {}", path.display());
        Self::parse_string(&content, format)
    }

    /// Parse configuration from a string
    pub fn parse_string(content: &str, format: ConfigFormat) -> Result<PipelineConfig> {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("YAML parse error: {e}"))),
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("JSON parse error: {e}"))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ConfigError::Parse(format!("TOML parse error: {e}"))),
        }
    }

    /// Detect configuration format from file extension
    pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ConfigError::Parse("Cannot determine config format from file extension".to_string())
        })?;

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::Parse(format!(
                "Unsupported config format: {ext}"
            ))),
        }
    }
}

/// Configuration serializer
pub struct ConfigSerializer;

impl ConfigSerializer {
    /// Serialize configuration to a file
    pub fn serialize_file(config: &PipelineConfig, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ConfigParser::detect_format(path)?;
        let content = Self::serialize_string(config, format)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Serialize configuration to a string
    pub fn serialize_string(config: &PipelineConfig, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(config)
                .map_err(|e| ConfigError::Parse(format!("YAML serialize error: {e}"))),
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("JSON serialize error: {e}"))),
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::Parse(format!("TOML serialize error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let content = r#"
            version = "2.0"

            [query]
            endpoint = "https://query.internal/api/aggregate"
            row_limit = 2000

            [retry]
            max_attempts = 5
        "#;

        let config = ConfigParser::parse_string(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.version, "2.0");
        assert_eq!(config.query.row_limit, 2000);
        assert_eq!(config.query.timeout_ms, 30_000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.pipeline.debounce_ms, 500);
    }

    #[test]
    fn test_parse_yaml() {
        let content = "pipeline:\n  debounce_ms: 300\ntransforms:\n  outlier_display: highlight\n";
        let config = ConfigParser::parse_string(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.pipeline.debounce_ms, 300);
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = ConfigParser::parse_string("{", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("JSON parse error"));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ConfigParser::detect_format(Path::new("pipeline.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigParser::detect_format(Path::new("pipeline.ini")).is_err());
        assert!(ConfigParser::detect_format(Path::new("pipeline")).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.query.row_limit = 1234;

        for name in ["pipeline.toml", "pipeline.yaml", "pipeline.json"] {
            let path = dir.path().join(name);
            ConfigSerializer::serialize_file(&config, &path).unwrap();
            assert_eq!(ConfigParser::parse_file(&path).unwrap(), config);
        }
    }
}
