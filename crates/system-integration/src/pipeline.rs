//! Per-widget chart data pipeline
//!
//! A pipeline owns one chart definition and turns it into a rendered series:
//! derive the effective filters from the store, compose the request, fetch
//! it (after the activation delay), post-process and publish the result.
//!
//! ```text
//! Idle -> Composing -> Fetching -> Rendered
//!                          \-----> Failed (last render kept)
//! ```
//!
//! Every fetch carries a per-widget request token. A response is only
//! applied when its token is still the latest one issued, so an older slow
//! response can never overwrite a newer one.
//!
//! Timing, row ceiling and outlier display are read from the live
//! [`ConfigHandle`] at trigger and fetch time, so configuration updates reach
//! running pipelines.

use crate::{IntegrationError, Result};
use crate::store::CrossFilterStore;
use crossfilter_config::{ConfigHandle, OutlierDisplay, TimingConfig};
use crossfilter_data::{
    apply_threshold, bin_histogram, detect_outliers, histogram_rows, reference_lines, IqrBounds,
    QueryComposer, QueryFetcher, ReferenceLines,
};
use crossfilter_shared::{
    ChartDefinition, ChartType, ErrorResponse, FilterRule, PipelineError, RemoteQueryRequest, Row,
    WidgetId,
};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How a pipeline is triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ActivationMode {
    /// Chart builder draft: fetches only when asked to
    Manual,
    /// Dashboard widget: refetches on every relevant input change
    Reactive,
}

impl ActivationMode {
    /// Delay between a trigger and the fetch it schedules
    pub fn delay(self, timing: &TimingConfig) -> Duration {
        match self {
            ActivationMode::Manual => Duration::from_millis(timing.manual_delay_ms),
            ActivationMode::Reactive => Duration::from_millis(timing.debounce_ms),
        }
    }

    /// State a widget falls back to when one of its inputs changes
    fn pending_state(self) -> PipelineState {
        match self {
            ActivationMode::Manual => PipelineState::Idle,
            ActivationMode::Reactive => PipelineState::Composing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PipelineState {
    Idle,
    Composing,
    Fetching,
    Rendered,
    Failed,
}

/// Finished series handed to the rendering layer
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RenderedSeries {
    pub token: u64,
    pub definition: ChartDefinition,
    pub rows: Vec<Row>,
    /// Detected outliers. Under `OutlierDisplay::Highlight` the rows above
    /// still contain them; under `Exclude` they are listed here only.
    pub outliers: Vec<Row>,
    pub outlier_bounds: Option<IqrBounds>,
    pub reference_lines: ReferenceLines,
}

impl RenderedSeries {
    /// Post-process a raw response in order: threshold limit, histogram
    /// binning, reference lines, outliers. Statistics always come from the
    /// unbinned rows since bins carry no y values.
    fn build(
        token: u64,
        definition: ChartDefinition,
        rows: Vec<Row>,
        outlier_display: OutlierDisplay,
    ) -> Self {
        let rows = apply_threshold(&definition, rows);

        let series_rows = if definition.chart_type == ChartType::Histogram {
            Some(histogram_rows(&bin_histogram(&definition.x_axis, &rows)))
        } else {
            None
        };

        let reference_lines = reference_lines(&definition, &rows);

        let (rows, outliers, outlier_bounds) = if definition.show_outliers {
            let partition = detect_outliers(&definition.y_axis, &rows);
            match outlier_display {
                OutlierDisplay::Highlight => (rows, partition.outliers, partition.bounds),
                OutlierDisplay::Exclude => (partition.normal, partition.outliers, partition.bounds),
            }
        } else {
            (rows, Vec::new(), None)
        };

        Self {
            token,
            rows: series_rows.unwrap_or(rows),
            definition,
            outliers,
            outlier_bounds,
            reference_lines,
        }
    }

    /// A successful fetch with nothing to draw
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of one fetch attempt
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Rendered(Arc<RenderedSeries>),
    Failed(PipelineError),
    /// A newer request was issued while this one was in flight
    Stale { token: u64 },
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PipelineStats {
    pub fetches: u64,
    pub renders: u64,
    pub failures: u64,
    pub stale_discarded: u64,
    pub superseded_triggers: u64,
    pub ignored_store_changes: u64,
    pub filter_cache_hits: u64,
}

struct FilterMemo {
    store_version: u64,
    revision: u64,
    filters: Vec<FilterRule>,
}

struct Core {
    definition: ChartDefinition,
    /// Bumped on every definition change
    revision: u64,
    state: PipelineState,
    rendered: Option<Arc<RenderedSeries>>,
    last_error: Option<PipelineError>,
    latest_token: u64,
    /// Bumped per trigger; a timer only fires if it is still current
    trigger_generation: u64,
    /// Filters the last trigger was based on
    applied_filters: Option<Vec<FilterRule>>,
    memo: Option<FilterMemo>,
    /// An input changed after the latest token was issued
    dirty: bool,
    closed: bool,
}

struct PipelineInner {
    widget_id: WidgetId,
    mode: ActivationMode,
    config: ConfigHandle,
    store: CrossFilterStore,
    fetcher: Arc<dyn QueryFetcher>,
    runtime: Handle,
    core: Mutex<Core>,
    stats: RwLock<PipelineStats>,
    rendered_tx: watch::Sender<Option<Arc<RenderedSeries>>>,
}

/// Owner handle of one widget's pipeline. Dropping it stops the store
/// watcher and disarms pending timers.
pub struct ChartPipeline {
    inner: Arc<PipelineInner>,
    watcher: Option<JoinHandle<()>>,
}

impl ChartPipeline {
    /// Create an idle pipeline. Must be called from within a tokio runtime.
    pub fn new(
        widget_id: WidgetId,
        definition: ChartDefinition,
        mode: ActivationMode,
        store: CrossFilterStore,
        fetcher: Arc<dyn QueryFetcher>,
        config: &ConfigHandle,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            IntegrationError::Lifecycle(format!("Chart pipeline needs a tokio runtime: {e}"))
        })?;
        let (rendered_tx, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(PipelineInner {
                widget_id,
                mode,
                config: config.clone(),
                store,
                fetcher,
                runtime,
                core: Mutex::new(Core {
                    definition,
                    revision: 0,
                    state: PipelineState::Idle,
                    rendered: None,
                    last_error: None,
                    latest_token: 0,
                    trigger_generation: 0,
                    applied_filters: None,
                    memo: None,
                    dirty: false,
                    closed: false,
                }),
                stats: RwLock::new(PipelineStats::default()),
                rendered_tx,
            }),
            watcher: None,
        })
    }

    /// Attach to the store. Reactive pipelines also fetch immediately.
    pub fn start(&mut self) {
        if self.watcher.is_some() {
            return;
        }

        let mut changes = self.inner.store.subscribe();
        let weak: Weak<PipelineInner> = Arc::downgrade(&self.inner);
        self.watcher = Some(self.inner.runtime.spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(inner) = weak.upgrade() else { break };
                inner.on_store_change();
            }
        }));

        log::info!(
            "Started {:?} pipeline for widget {}",
            self.inner.mode,
            self.inner.widget_id
        );

        if self.inner.mode == ActivationMode::Reactive {
            self.inner.trigger(Duration::ZERO);
        }
    }

    /// Replace the chart definition. Reactive widgets refetch after the
    /// debounce window; manual drafts go back to `Idle`.
    pub fn update_definition(&self, definition: ChartDefinition) {
        {
            let mut core = self.inner.core.lock();
            if core.definition == definition {
                return;
            }
            core.definition = definition;
            core.revision += 1;
            core.dirty = true;
            core.state = self.inner.mode.pending_state();
        }

        if self.inner.mode == ActivationMode::Reactive {
            self.inner.trigger(self.inner.delay());
        }
    }

    /// Schedule a fetch after the mode's delay
    pub fn run(&self) {
        self.inner.trigger(self.inner.delay());
    }

    /// Fetch immediately and wait for the outcome. Pending timers are
    /// superseded.
    pub async fn fetch_now(&self) -> FetchOutcome {
        self.inner.core.lock().trigger_generation += 1;
        self.inner.execute().await
    }

    /// Effective filter set for the current definition and store version
    pub fn effective_filters(&self) -> Vec<FilterRule> {
        let mut core = self.inner.core.lock();
        self.inner.effective_filters(&mut core)
    }

    /// Request the pipeline would send right now
    pub fn compose_request(&self) -> RemoteQueryRequest {
        let mut core = self.inner.core.lock();
        let filters = self.inner.effective_filters(&mut core);
        self.inner.composer().compose(&core.definition, &filters)
    }

    /// Receiver for every newly rendered series
    pub fn subscribe_rendered(&self) -> watch::Receiver<Option<Arc<RenderedSeries>>> {
        self.inner.rendered_tx.subscribe()
    }

    pub fn widget_id(&self) -> &WidgetId {
        &self.inner.widget_id
    }

    pub fn mode(&self) -> ActivationMode {
        self.inner.mode
    }

    pub fn definition(&self) -> ChartDefinition {
        self.inner.core.lock().definition.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.inner.core.lock().state
    }

    pub fn rendered(&self) -> Option<Arc<RenderedSeries>> {
        self.inner.core.lock().rendered.clone()
    }

    pub fn last_error(&self) -> Option<PipelineError> {
        self.inner.core.lock().last_error.clone()
    }

    /// Last fetch error wrapped for the presentation layer
    pub fn error_response(&self) -> Option<ErrorResponse> {
        self.last_error().map(|error| {
            ErrorResponse::new(error)
                .with_context("ChartPipeline", "fetch")
                .with_metadata(serde_json::json!({ "widget": self.inner.widget_id.as_str() }))
        })
    }

    pub fn get_stats(&self) -> PipelineStats {
        self.inner.stats.read().clone()
    }
}

impl Drop for ChartPipeline {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        let mut core = self.inner.core.lock();
        core.closed = true;
        core.trigger_generation += 1;
    }
}

impl PipelineInner {
    fn delay(&self) -> Duration {
        self.mode.delay(&self.config.current().pipeline)
    }

    fn composer(&self) -> QueryComposer {
        QueryComposer::with_row_limit(self.config.current().query.row_limit)
    }

    fn effective_filters(&self, core: &mut Core) -> Vec<FilterRule> {
        let snapshot = self.store.snapshot();

        if let Some(memo) = &core.memo {
            if memo.store_version == snapshot.version && memo.revision == core.revision {
                self.stats.write().filter_cache_hits += 1;
                return memo.filters.clone();
            }
        }

        let filters = snapshot.effective_filters(&self.widget_id, &core.definition.saved_filters);
        core.memo = Some(FilterMemo {
            store_version: snapshot.version,
            revision: core.revision,
            filters: filters.clone(),
        });
        filters
    }

    fn on_store_change(self: &Arc<Self>) {
        {
            let mut core = self.core.lock();
            if core.closed {
                return;
            }

            let filters = self.effective_filters(&mut core);
            if core.applied_filters.as_ref() == Some(&filters) {
                self.stats.write().ignored_store_changes += 1;
                log::debug!(
                    "Widget {}: store change leaves its filters unchanged",
                    self.widget_id
                );
                return;
            }

            core.applied_filters = Some(filters);
            core.dirty = true;
            core.state = self.mode.pending_state();
        }

        if self.mode == ActivationMode::Reactive {
            self.trigger(self.delay());
        }
    }

    /// Arm a timer that fetches after `delay` unless a newer trigger
    /// arrives first
    fn trigger(self: &Arc<Self>, delay: Duration) {
        let generation = {
            let mut core = self.core.lock();
            if core.closed {
                return;
            }
            core.trigger_generation += 1;
            core.trigger_generation
        };

        let weak = Arc::downgrade(self);
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let Some(inner) = weak.upgrade() else { return };
            let current = inner.core.lock().trigger_generation;
            if current != generation {
                inner.stats.write().superseded_triggers += 1;
                return;
            }

            inner.execute().await;
        });
    }

    async fn execute(&self) -> FetchOutcome {
        let (token, request, definition) = {
            let mut core = self.core.lock();
            if core.closed {
                return FetchOutcome::Failed(PipelineError::Cancelled);
            }

            core.state = PipelineState::Composing;
            let filters = self.effective_filters(&mut core);
            let request = self.composer().compose(&core.definition, &filters);
            core.applied_filters = Some(filters);
            core.latest_token += 1;
            core.dirty = false;
            core.state = PipelineState::Fetching;
            (core.latest_token, request, core.definition.clone())
        };

        self.stats.write().fetches += 1;
        log::debug!("Widget {}: issuing request token {}", self.widget_id, token);

        let result = self.fetcher.fetch(request).await;

        let mut core = self.core.lock();
        if token != core.latest_token || core.closed {
            self.stats.write().stale_discarded += 1;
            log::debug!(
                "Widget {}: discarding response for token {} (latest {})",
                self.widget_id,
                token,
                core.latest_token
            );
            return FetchOutcome::Stale { token };
        }

        let settled = if core.dirty {
            self.mode.pending_state()
        } else {
            PipelineState::Rendered
        };

        match result {
            Ok(response) => {
                let series = Arc::new(RenderedSeries::build(
                    token,
                    definition,
                    response.data,
                    self.config.current().transforms.outlier_display,
                ));
                core.rendered = Some(Arc::clone(&series));
                core.last_error = None;
                core.state = settled;
                drop(core);

                self.stats.write().renders += 1;
                self.rendered_tx.send_replace(Some(Arc::clone(&series)));
                FetchOutcome::Rendered(series)
            }
            Err(e) => {
                log::warn!("Widget {}: fetch for token {} failed: {}", self.widget_id, token, e);
                core.last_error = Some(e.clone());
                core.state = if core.dirty {
                    self.mode.pending_state()
                } else {
                    PipelineState::Failed
                };
                drop(core);

                self.stats.write().failures += 1;
                FetchOutcome::Failed(e)
            }
        }
    }
}
