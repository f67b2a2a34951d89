//! Configuration validation utilities

use crate::{ConfigError, PipelineConfig, Result};

/// Upper bound on the reactive debounce window
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Configuration validator with comprehensive checks
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &PipelineConfig) -> Result<()> {
        if config.version.is_empty() {
            return Err(ConfigError::Validation(
                "Version cannot be empty".to_string(),
            ));
        }

        Self::validate_query(&config.query)?;
        Self::validate_timing(&config.pipeline)?;
        Self::validate_retry(&config.retry)?;

        Ok(())
    }

    fn validate_query(query: &crate::QueryConfig) -> Result<()> {
        let endpoint = url::Url::parse(&query.endpoint).map_err(|e| {
            ConfigError::Validation(format!("Invalid query endpoint '{}': {e}", query.endpoint))
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "Query endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if query.row_limit == 0 {
            return Err(ConfigError::Validation(
                "Row limit must be greater than 0".to_string(),
            ));
        }

        if query.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Query timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_timing(timing: &crate::TimingConfig) -> Result<()> {
        if timing.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "Invalid debounce_ms: {}. Must be at most {}",
                timing.debounce_ms, MAX_DEBOUNCE_MS
            )));
        }

        if timing.manual_delay_ms > timing.debounce_ms {
            log::warn!(
                "manual_delay_ms ({}) exceeds debounce_ms ({}); \
                 manual fetches will lag dashboard widgets",
                timing.manual_delay_ms,
                timing.debounce_ms
            );
        }

        Ok(())
    }

    fn validate_retry(retry: &crate::RetryConfig) -> Result<()> {
        if retry.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation(format!(
                "Invalid backoff_multiplier: {}. Must be at least 1.0",
                retry.backoff_multiplier
            )));
        }

        if retry.max_backoff_ms < retry.initial_backoff_ms {
            return Err(ConfigError::Validation(
                "Retry max_backoff_ms cannot be lower than initial_backoff_ms".to_string(),
            ));
        }

        Ok(())
    }
}
