//! Remote query fetching
//!
//! The query service is an external collaborator; `QueryFetcher` is the
//! seam the pipeline talks to. `HttpQueryFetcher` posts the request as JSON.

use crossfilter_config::QueryConfig;
use crossfilter_shared::{PipelineError, PipelineResult, QueryResponse, RemoteQueryRequest};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Executes a composed request against the remote aggregation engine
pub trait QueryFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>>;
}

impl<F: QueryFetcher + ?Sized> QueryFetcher for Arc<F> {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
        (**self).fetch(request)
    }
}

/// JSON-over-HTTP fetcher
#[derive(Clone)]
pub struct HttpQueryFetcher {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpQueryFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Internal {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Fetcher for the configured query endpoint and timeout
    pub fn from_config(config: &QueryConfig) -> PipelineResult<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QueryFetcher for HttpQueryFetcher {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let timeout_ms = self.timeout.as_millis() as u64;

        Box::pin(async move {
            let response = client
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| classify(e, &endpoint, timeout_ms))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PipelineError::Fetch {
                    message: format!("HTTP {status} (URL: {endpoint})"),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| classify(e, &endpoint, timeout_ms))?;

            let parsed: QueryResponse = serde_json::from_slice(&body)?;
            log::debug!("Fetched {} rows from {}", parsed.data.len(), endpoint);
            Ok(parsed)
        })
    }
}

fn classify(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> PipelineError {
    if err.is_timeout() {
        PipelineError::Timeout {
            message: format!("{err} (URL: {endpoint})"),
            duration_ms: timeout_ms,
        }
    } else {
        PipelineError::Network {
            message: format!("{err} (URL: {endpoint})"),
        }
    }
}
