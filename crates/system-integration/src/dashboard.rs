//! Dashboard session: one store shared by many reactive widget pipelines

use crate::error_recovery::{RecoveryStats, RetryPolicy, RetryingFetcher};
use crate::lifecycle::{LifecycleCoordinator, LifecycleStats};
use crate::pipeline::{ActivationMode, ChartPipeline, PipelineStats};
use crate::store::CrossFilterStore;
use crate::{IntegrationError, Result};
use crossfilter_config::ConfigHandle;
use crossfilter_data::{HttpQueryFetcher, QueryFetcher};
use crossfilter_shared::{ChartDefinition, Selection, WidgetId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dashboard-wide statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardStats {
    pub widgets: usize,
    pub store_version: u64,
    pub lifecycle: LifecycleStats,
    pub recovery: RecoveryStats,
    pub pipelines: BTreeMap<String, PipelineStats>,
}

/// A mounted dashboard view. The store is created with the dashboard and
/// hard-reset when it unmounts, so filters never leak between views.
pub struct Dashboard {
    store: CrossFilterStore,
    fetcher: Arc<RetryingFetcher<Arc<dyn QueryFetcher>>>,
    config: ConfigHandle,
    lifecycle: LifecycleCoordinator,
    widgets: BTreeMap<WidgetId, ChartPipeline>,
}

impl Dashboard {
    /// Dashboard over `fetcher`. Every widget fetch goes through the retry
    /// policy of the configuration current at construction.
    pub fn new(fetcher: Arc<dyn QueryFetcher>, config: ConfigHandle) -> Self {
        let policy = RetryPolicy::from(&config.current().retry);
        Self {
            store: CrossFilterStore::new(),
            fetcher: Arc::new(RetryingFetcher::new(fetcher, policy)),
            config,
            lifecycle: LifecycleCoordinator::new(),
            widgets: BTreeMap::new(),
        }
    }

    /// Dashboard posting to the configured HTTP query endpoint
    pub fn connect(config: ConfigHandle) -> Result<Self> {
        let fetcher = HttpQueryFetcher::from_config(&config.current().query)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// Mount the view and start a pipeline for every saved widget
    pub fn mount(&mut self, saved: Vec<(WidgetId, ChartDefinition)>) -> Result<()> {
        self.lifecycle.mount()?;
        for (id, definition) in saved {
            self.insert_widget(id, definition)?;
        }
        log::info!("Dashboard mounted with {} widgets", self.widgets.len());
        Ok(())
    }

    /// Pin a new chart. Only allowed in edit mode.
    pub fn add_widget(&mut self, definition: ChartDefinition) -> Result<WidgetId> {
        if !self.store.edit_mode() {
            return Err(IntegrationError::EditModeRequired);
        }

        let id = WidgetId::new(uuid::Uuid::new_v4().to_string());
        self.insert_widget(id.clone(), definition)?;
        Ok(id)
    }

    /// Start a reactive pipeline for a widget with a known id
    fn insert_widget(&mut self, id: WidgetId, definition: ChartDefinition) -> Result<()> {
        if !self.lifecycle.is_mounted() {
            return Err(IntegrationError::Lifecycle(
                "Dashboard must be mounted to host widgets".to_string(),
            ));
        }

        let fetcher: Arc<dyn QueryFetcher> = self.fetcher.clone();
        let mut pipeline = ChartPipeline::new(
            id.clone(),
            definition,
            ActivationMode::Reactive,
            self.store.clone(),
            fetcher,
            &self.config,
        )?;
        pipeline.start();

        if let Some(replaced) = self.widgets.insert(id, pipeline) {
            log::debug!("Replaced pipeline for widget {}", replaced.widget_id());
        }
        Ok(())
    }

    /// Unpin a chart and drop its selection. Only allowed in edit mode.
    pub fn remove_widget(&mut self, id: &WidgetId) -> Result<()> {
        if !self.store.edit_mode() {
            return Err(IntegrationError::EditModeRequired);
        }

        self.widgets
            .remove(id)
            .ok_or_else(|| IntegrationError::WidgetNotFound(id.to_string()))?;
        self.store.set_selection(id, None);
        Ok(())
    }

    /// Record a click on `id`. Every other widget narrows to it.
    pub fn select(&self, id: &WidgetId, selection: Option<Selection>) -> Result<()> {
        if !self.widgets.contains_key(id) {
            return Err(IntegrationError::WidgetNotFound(id.to_string()));
        }
        self.store.set_selection(id, selection);
        Ok(())
    }

    pub fn toggle_edit_mode(&self) -> bool {
        self.store.toggle_edit_mode()
    }

    pub fn widget(&self, id: &WidgetId) -> Option<&ChartPipeline> {
        self.widgets.get(id)
    }

    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.widgets.keys().cloned().collect()
    }

    pub fn store(&self) -> &CrossFilterStore {
        &self.store
    }

    pub fn lifecycle(&self) -> &LifecycleCoordinator {
        &self.lifecycle
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.fetcher.policy()
    }

    /// Tear down every widget and hard-reset the store
    pub fn unmount(&mut self) -> Result<()> {
        self.lifecycle.unmount()?;
        self.widgets.clear();
        self.store.reset();
        Ok(())
    }

    pub fn get_stats(&self) -> DashboardStats {
        DashboardStats {
            widgets: self.widgets.len(),
            store_version: self.store.version(),
            lifecycle: self.lifecycle.get_stats(),
            recovery: self.fetcher.get_stats(),
            pipelines: self
                .widgets
                .iter()
                .map(|(id, pipeline)| (id.to_string(), pipeline.get_stats()))
                .collect(),
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if self.lifecycle.is_mounted() {
            if let Err(e) = self.unmount() {
                log::warn!("Failed to unmount dashboard on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossfilter_shared::{ChartType, PipelineResult, QueryResponse, RemoteQueryRequest};
    use futures::future::BoxFuture;

    struct EmptyBackend;

    impl QueryFetcher for EmptyBackend {
        fn fetch(
            &self,
            _request: RemoteQueryRequest,
        ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
            Box::pin(async { Ok(QueryResponse::default()) })
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(Arc::new(EmptyBackend), ConfigHandle::default())
    }

    fn chart() -> ChartDefinition {
        ChartDefinition::new(ChartType::Pie, "city", "sales")
    }

    fn city(value: &str) -> Option<Selection> {
        Some(Selection::from([("city".to_string(), value.to_string())]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_widgets_require_mount() {
        let mut dashboard = dashboard();
        let err = dashboard.insert_widget(WidgetId::from("w"), chart()).unwrap_err();
        assert!(matches!(err, IntegrationError::Lifecycle(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_mode_gates_layout_changes() {
        let mut dashboard = dashboard();
        dashboard.mount(vec![(WidgetId::from("saved"), chart())]).unwrap();

        assert!(matches!(
            dashboard.add_widget(chart()),
            Err(IntegrationError::EditModeRequired)
        ));
        assert!(matches!(
            dashboard.remove_widget(&WidgetId::from("saved")),
            Err(IntegrationError::EditModeRequired)
        ));

        assert!(dashboard.toggle_edit_mode());
        let id = dashboard.add_widget(chart()).unwrap();
        assert_eq!(dashboard.widget_ids().len(), 2);
        assert!(dashboard.widget(&id).is_some());

        dashboard.remove_widget(&WidgetId::from("saved")).unwrap();
        assert!(matches!(
            dashboard.remove_widget(&WidgetId::from("saved")),
            Err(IntegrationError::WidgetNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_widget_drops_its_selection() {
        let mut dashboard = dashboard();
        let pie = WidgetId::from("pie");
        dashboard.mount(vec![(pie.clone(), chart())]).unwrap();

        dashboard.select(&pie, city("Delhi")).unwrap();
        assert!(dashboard.store().snapshot().selection_of(&pie).is_some());

        dashboard.toggle_edit_mode();
        dashboard.remove_widget(&pie).unwrap();
        assert!(dashboard.store().snapshot().selection_of(&pie).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_follows_config() {
        let mut config = crossfilter_config::PipelineConfig::default();
        config.retry.max_attempts = 5;
        config.retry.initial_backoff_ms = 50;
        let config = ConfigHandle::new(config).unwrap();
        let dashboard = Dashboard::new(Arc::new(EmptyBackend), config);

        assert_eq!(dashboard.retry_policy().max_attempts, 5);
        assert_eq!(
            dashboard.retry_policy().backoff(0),
            std::time::Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn test_connect_uses_configured_endpoint() {
        let mut config = crossfilter_config::PipelineConfig::default();
        config.query.endpoint = "http://127.0.0.1:9/query".to_string();
        config.retry.max_attempts = 1;
        let mut dashboard = Dashboard::connect(ConfigHandle::new(config).unwrap()).unwrap();
        let widget = WidgetId::from("pie");
        dashboard.mount(vec![(widget.clone(), chart())]).unwrap();

        let outcome = dashboard.widget(&widget).unwrap().fetch_now().await;
        assert!(matches!(
            outcome,
            crate::FetchOutcome::Failed(crossfilter_shared::PipelineError::Network { .. })
        ));
        let recovery = dashboard.get_stats().recovery;
        assert!(recovery.attempts >= 1);
        assert_eq!(recovery.retries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_widget() {
        let mut dashboard = dashboard();
        dashboard.mount(Vec::new()).unwrap();
        assert!(matches!(
            dashboard.select(&WidgetId::from("ghost"), city("Delhi")),
            Err(IntegrationError::WidgetNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_resets_everything() {
        let mut dashboard = dashboard();
        let pie = WidgetId::from("pie");
        dashboard.mount(vec![(pie.clone(), chart())]).unwrap();
        dashboard.select(&pie, city("Delhi")).unwrap();
        dashboard.toggle_edit_mode();

        dashboard.unmount().unwrap();
        let snapshot = dashboard.store().snapshot();
        assert!(!snapshot.has_filters());
        assert!(!snapshot.edit_mode);
        assert!(dashboard.widget_ids().is_empty());

        // Remounting starts from a clean slate
        dashboard.mount(vec![(pie.clone(), chart())]).unwrap();
        assert!(dashboard.store().snapshot().selection_of(&pie).is_none());
        assert_eq!(dashboard.get_stats().lifecycle.mounts, 2);
    }
}
