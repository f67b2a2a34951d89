//! Cross-filter dashboard integration
//!
//! Ties the shared model, the data layer and the configuration system
//! together: the per-dashboard coordination store, the per-widget chart
//! pipeline, retrying fetches and the dashboard session lifecycle.

pub mod builder;
pub mod dashboard;
pub mod error_recovery;
pub mod lifecycle;
pub mod pipeline;
pub mod store;

pub use builder::ChartBuilder;
pub use dashboard::{Dashboard, DashboardStats};
pub use error_recovery::{RecoveryStats, RetryPolicy, RetryingFetcher};
pub use lifecycle::{LifecycleCoordinator, LifecycleState, LifecycleStats};
pub use pipeline::{
    ActivationMode, ChartPipeline, FetchOutcome, PipelineState, PipelineStats, RenderedSeries,
};
pub use store::CrossFilterStore;

use crossfilter_config::ConfigError;
use crossfilter_shared::PipelineError;
use thiserror::Error;

/// Dashboard integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Dashboard must be in edit mode to change its widgets")]
    EditModeRequired,

    #[error("Widget not found: {0}")]
    WidgetNotFound(String),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
