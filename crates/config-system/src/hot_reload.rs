//! Hot-reloadable configuration handle
//!
//! Readers get the current configuration without locking; updates are
//! validated first and then swapped in atomically.

use crate::{ConfigError, ConfigValidator, PipelineConfig, Result};
use arc_swap::ArcSwap;
use parking_lot::RwLock;
use std::sync::Arc;

const MAX_HISTORY: usize = 10;

/// Shared, cloneable handle to the live pipeline configuration
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<PipelineConfig>>,
    history: Arc<RwLock<Vec<Arc<PipelineConfig>>>>,
}

impl Default for ConfigHandle {
    fn default() -> Self {
        let initial = Arc::new(PipelineConfig::default());
        Self {
            current: Arc::new(ArcSwap::new(initial.clone())),
            history: Arc::new(RwLock::new(vec![initial])),
        }
    }
}

impl ConfigHandle {
    /// Create a handle after validating `initial`
    pub fn new(initial: PipelineConfig) -> Result<Self> {
        ConfigValidator::validate(&initial)?;
        let initial = Arc::new(initial);
        Ok(Self {
            current: Arc::new(ArcSwap::new(initial.clone())),
            history: Arc::new(RwLock::new(vec![initial])),
        })
    }

    /// Current configuration
    pub fn current(&self) -> Arc<PipelineConfig> {
        self.current.load_full()
    }

    /// Validate and swap in a new configuration
    pub fn update(&self, config: PipelineConfig) -> Result<()> {
        ConfigValidator::validate(&config)?;

        if *self.current.load_full() == config {
            return Ok(());
        }

        let config = Arc::new(config);
        self.current.store(config.clone());

        let mut history = self.history.write();
        history.push(config);
        if history.len() > MAX_HISTORY {
            history.remove(0);
        }

        log::info!("Pipeline configuration updated");
        Ok(())
    }

    /// Restore the configuration `steps` updates back
    pub fn rollback(&self, steps: usize) -> Result<()> {
        let mut history = self.history.write();
        if steps == 0 || steps >= history.len() {
            return Err(ConfigError::Validation(format!(
                "Cannot roll back {steps} steps with {} configurations in history",
                history.len()
            )));
        }

        let keep = history.len() - steps;
        history.truncate(keep);
        if let Some(target) = history.last() {
            self.current.store(target.clone());
        }

        log::info!("Pipeline configuration rolled back {steps} step(s)");
        Ok(())
    }
}
