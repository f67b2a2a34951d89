//! Cross-filtering dashboard demonstration
//!
//! Runs two widgets against a canned backend, clicks one of them and prints
//! the requests each widget sends.

use crossfilter_config::ConfigHandle;
use crossfilter_data::QueryFetcher;
use crossfilter_integration::{ChartBuilder, Dashboard};
use crossfilter_shared::{
    AggMethod, ChartDefinition, ChartType, LimitConfig, PipelineResult, QueryResponse,
    RemoteQueryRequest, Selection, WidgetId,
};
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Logs every request and answers with a fixed aggregate
struct CannedBackend;

impl QueryFetcher for CannedBackend {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
        let result = canned_response(&request);
        Box::pin(async move { result })
    }
}

fn canned_response(request: &RemoteQueryRequest) -> PipelineResult<QueryResponse> {
    println!("  -> {}", serde_json::to_string(request)?);
    let rows = [("North", 120), ("South", 80), ("East", 45)]
        .iter()
        .filter_map(|(region, sales)| {
            json!({ "region": region, "sales": sales })
                .as_object()
                .cloned()
        })
        .collect();
    Ok(QueryResponse::new(rows))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Cross-filter dashboard demo\n");

    let config = ConfigHandle::default();
    let fetcher: Arc<dyn QueryFetcher> = Arc::new(CannedBackend);

    println!("Chart builder preview:");
    let builder = ChartBuilder::new(
        ChartDefinition::new(ChartType::Bar, "region", "sales")
            .pivot(AggMethod::Sum)
            .with_limit(LimitConfig::top(2.0)),
        Arc::clone(&fetcher),
        &config,
    )?;
    builder.preview().await;
    if let Some(series) = builder.rendered() {
        println!("  rendered {} rows\n", series.rows.len());
    }

    println!("Mounting dashboard:");
    let mut dashboard = Dashboard::new(fetcher, config);
    let regions = WidgetId::from("sales-by-region");
    dashboard.mount(vec![
        (regions.clone(), builder.definition()),
        (
            WidgetId::from("sales-by-segment"),
            ChartDefinition::new(ChartType::Pie, "segment", "sales").pivot(AggMethod::Sum),
        ),
    ])?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\nClicking 'North' on {regions}:");
    let click = Selection::from([("region".to_string(), "North".to_string())]);
    dashboard.select(&regions, Some(click))?;
    tokio::time::sleep(Duration::from_millis(700)).await;

    println!("\nDashboard stats:");
    println!("{}", serde_json::to_string_pretty(&dashboard.get_stats())?);

    dashboard.unmount()?;
    Ok(())
}
