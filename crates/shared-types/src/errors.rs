//! Common error types used across all crossfilter crates
//! Provides consistent error handling and reporting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for pipeline operations
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PipelineError {
    #[error("Query fetch failed: {message}")]
    Fetch { message: String },

    #[error("Network request failed: {message}")]
    Network { message: String },

    #[error("Request timeout: {message}")]
    Timeout { message: String, duration_ms: u64 },

    #[error("Response parse error: {message}")]
    Parse { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Widget not found: {id}")]
    WidgetNotFound { id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    /// Transient remote failures that a retry may resolve
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch { .. }
                | PipelineError::Network { .. }
                | PipelineError::Timeout { .. }
        )
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error envelope handed to the presentation layer
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: PipelineError,
    pub timestamp: u64,
    pub context: Option<ErrorContext>,
}

/// Additional context for error reporting
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub metadata: serde_json::Value,
}

impl ErrorResponse {
    pub fn new(error: PipelineError) -> Self {
        Self {
            success: false,
            error,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            context: None,
        }
    }

    pub fn with_context(mut self, component: &str, operation: &str) -> Self {
        self.context = Some(ErrorContext {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: serde_json::Value::Null,
        });
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        if let Some(ref mut ctx) = self.context {
            ctx.metadata = metadata;
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            concat!(
                r#"{"success":false,"error":{"type":"Internal","#,
                r#""details":{"message":"Failed to serialize error"}}}"#
            )
            .to_string()
        })
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parse {
            message: format!("line {}: {}", err.line(), err),
        }
    }
}
