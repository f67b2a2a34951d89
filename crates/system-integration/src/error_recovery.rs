//! Bounded retry with exponential backoff for remote fetches

use crossfilter_config::RetryConfig;
use crossfilter_data::QueryFetcher;
use crossfilter_shared::{PipelineResult, QueryResponse, RemoteQueryRequest};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Retry schedule derived from [`RetryConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier.max(1.0),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based), capped at `max_backoff`.
    /// The growth is computed in floating point and clamped before it is
    /// turned back into a `Duration`, so large retry counts saturate.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_backoff.as_nanos() as f64 {
            return self.max_backoff;
        }
        Duration::from_nanos(nanos as u64)
    }
}

/// Recovery statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RecoveryStats {
    pub attempts: u64,
    pub retries: u64,
    pub successful_recoveries: u64,
    pub exhausted: u64,
}

/// Wraps a fetcher and retries transient failures
pub struct RetryingFetcher<F> {
    inner: Arc<F>,
    policy: RetryPolicy,
    stats: Arc<RwLock<RecoveryStats>>,
}

impl<F: QueryFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(inner),
            policy,
            stats: Arc::new(RwLock::new(RecoveryStats::default())),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn get_stats(&self) -> RecoveryStats {
        self.stats.read().clone()
    }
}

impl<F: QueryFetcher> QueryFetcher for RetryingFetcher<F> {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
        let inner = Arc::clone(&self.inner);
        let policy = self.policy.clone();
        let stats = Arc::clone(&self.stats);

        Box::pin(async move {
            let mut attempt = 0;
            loop {
                attempt += 1;
                stats.write().attempts += 1;

                match inner.fetch(request.clone()).await {
                    Ok(response) => {
                        if attempt > 1 {
                            stats.write().successful_recoveries += 1;
                        }
                        return Ok(response);
                    }
                    Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                        let delay = policy.backoff(attempt - 1);
                        log::warn!(
                            "Fetch attempt {}/{} failed: {}; retrying in {:?}",
                            attempt,
                            policy.max_attempts,
                            e,
                            delay
                        );
                        stats.write().retries += 1;
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        if e.is_retryable() {
                            stats.write().exhausted += 1;
                        }
                        return Err(e);
                    }
                }
            }
        })
    }
}
