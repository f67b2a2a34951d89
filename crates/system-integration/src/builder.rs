//! Chart builder draft
//!
//! The builder edits a chart definition control by control. Each edit sends
//! the draft back to `Idle`; nothing is fetched until [`ChartBuilder::run`]
//! or [`ChartBuilder::preview`] is called.

use crate::dashboard::Dashboard;
use crate::pipeline::{
    ActivationMode, ChartPipeline, FetchOutcome, PipelineState, RenderedSeries,
};
use crate::store::CrossFilterStore;
use crate::Result;
use crossfilter_config::ConfigHandle;
use crossfilter_data::QueryFetcher;
use crossfilter_shared::{
    AggMethod, ChartDefinition, ChartType, FilterRule, LimitConfig, PipelineResult, WidgetId,
};
use std::sync::Arc;

/// Builder widgets live outside any dashboard
const DRAFT_WIDGET_ID: &str = "chart-builder-draft";

pub struct ChartBuilder {
    pipeline: ChartPipeline,
}

impl ChartBuilder {
    pub fn new(
        definition: ChartDefinition,
        fetcher: Arc<dyn QueryFetcher>,
        config: &ConfigHandle,
    ) -> Result<Self> {
        // A private store: dashboard selections never reach a draft
        let pipeline = ChartPipeline::new(
            WidgetId::from(DRAFT_WIDGET_ID),
            definition,
            ActivationMode::Manual,
            CrossFilterStore::new(),
            fetcher,
            config,
        )?;
        Ok(Self { pipeline })
    }

    /// Reopen a saved chart from its persisted JSON form
    pub fn from_saved(
        json: &str,
        fetcher: Arc<dyn QueryFetcher>,
        config: &ConfigHandle,
    ) -> Result<Self> {
        let definition: ChartDefinition =
            serde_json::from_str(json).map_err(crossfilter_shared::PipelineError::from)?;
        Self::new(definition, fetcher, config)
    }

    /// Persisted JSON form of the current draft
    pub fn save(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string(&self.pipeline.definition())?)
    }

    pub fn definition(&self) -> ChartDefinition {
        self.pipeline.definition()
    }

    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn rendered(&self) -> Option<Arc<RenderedSeries>> {
        self.pipeline.rendered()
    }

    pub fn pipeline(&self) -> &ChartPipeline {
        &self.pipeline
    }

    pub fn set_chart_type(&self, chart_type: ChartType) {
        self.edit(|d| d.chart_type = chart_type);
    }

    pub fn set_axes(&self, x_axis: &str, y_axis: &str) {
        self.edit(|d| {
            d.x_axis = x_axis.to_string();
            d.y_axis = y_axis.to_string();
        });
    }

    /// Toggle pivot mode. Without a method the query aggregates with `sum`.
    pub fn set_pivot(&self, enabled: bool, method: Option<AggMethod>) {
        self.edit(|d| {
            d.is_pivot = enabled;
            d.agg_method = method;
        });
    }

    pub fn set_limit(&self, limit: LimitConfig) {
        self.edit(|d| d.limit = limit);
    }

    pub fn set_statistics(&self, show_average: bool, show_median: bool, show_outliers: bool) {
        self.edit(|d| {
            d.show_average = show_average;
            d.show_median = show_median;
            d.show_outliers = show_outliers;
        });
    }

    /// Add or replace (by id) a saved filter
    pub fn add_filter(&self, rule: FilterRule) {
        self.edit(|d| match d.saved_filters.iter().position(|f| f.id == rule.id) {
            Some(index) => d.saved_filters[index] = rule,
            None => d.saved_filters.push(rule),
        });
    }

    pub fn remove_filter(&self, id: &str) {
        self.edit(|d| d.saved_filters.retain(|f| f.id != id));
    }

    /// Schedule a fetch of the current draft
    pub fn run(&self) {
        self.pipeline.run();
    }

    /// Fetch the current draft and wait for it
    pub async fn preview(&self) -> FetchOutcome {
        self.pipeline.fetch_now().await
    }

    /// Pin the draft to a dashboard. The dashboard must be in edit mode.
    pub fn pin_to(&self, dashboard: &mut Dashboard) -> Result<WidgetId> {
        dashboard.add_widget(self.definition())
    }

    fn edit(&self, f: impl FnOnce(&mut ChartDefinition)) {
        let mut definition = self.pipeline.definition();
        f(&mut definition);
        self.pipeline.update_definition(definition);
    }
}
