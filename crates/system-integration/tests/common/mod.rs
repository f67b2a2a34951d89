//! In-memory stand-in for the remote aggregation engine

#![allow(dead_code)]

use crossfilter_data::values::{as_number, stringify};
use crossfilter_data::{apply_filters, QueryFetcher};
use crossfilter_shared::{
    AggMethod, FilterRule, PipelineError, PipelineResult, QueryResponse, RemoteQueryRequest, Row,
    SortDirection,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Executes requests against a fixed table: filter, group, aggregate,
/// sort, limit
pub struct InMemoryBackend {
    rows: Vec<Row>,
    latency: Duration,
    requests: Mutex<Vec<RemoteQueryRequest>>,
    /// Number of upcoming calls that fail with a network error
    failures_left: AtomicU32,
}

impl InMemoryBackend {
    pub fn new(rows: Vec<Row>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            latency: Duration::from_millis(20),
            requests: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(0),
        })
    }

    pub fn fail_next(&self, calls: u32) {
        self.failures_left.store(calls, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<RemoteQueryRequest> {
        self.requests.lock().clone()
    }

    pub fn execute(&self, request: &RemoteQueryRequest) -> Vec<Row> {
        let rules: Vec<FilterRule> = request
            .filters
            .iter()
            .enumerate()
            .map(|(i, f)| {
                FilterRule::new(format!("q{i}"), f.column.clone(), f.operator, f.value.clone())
            })
            .collect();
        let mut rows = apply_filters(&rules, &self.rows);

        if let Some(group_by) = &request.group_by {
            let agg_column = request.agg_column.clone().unwrap_or_default();
            let method = request.agg_method.unwrap_or(AggMethod::Sum);
            rows = aggregate(&rows, group_by, &agg_column, method);
        }

        if let (Some(sort_by), Some(direction)) = (&request.sort_by, request.sort_direction) {
            rows.sort_by(|a, b| {
                let a = as_number(a.get(sort_by)).unwrap_or(f64::NEG_INFINITY);
                let b = as_number(b.get(sort_by)).unwrap_or(f64::NEG_INFINITY);
                match direction {
                    SortDirection::Asc => a.total_cmp(&b),
                    SortDirection::Desc => b.total_cmp(&a),
                }
            });
        }

        rows.truncate(request.limit as usize);
        rows
    }
}

impl QueryFetcher for InMemoryBackend {
    fn fetch(
        &self,
        request: RemoteQueryRequest,
    ) -> BoxFuture<'static, PipelineResult<QueryResponse>> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let result = if failing {
            Err(PipelineError::Network {
                message: "connection reset by peer".to_string(),
            })
        } else {
            Ok(QueryResponse::new(self.execute(&request)))
        };
        self.requests.lock().push(request);

        let latency = self.latency;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            result
        })
    }
}

fn aggregate(rows: &[Row], group_by: &str, agg_column: &str, method: AggMethod) -> Vec<Row> {
    let mut groups: Vec<(String, Vec<f64>, usize)> = Vec::new();
    for row in rows {
        let key = stringify(row.get(group_by)).into_owned();
        let index = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((key, Vec::new(), 0));
                groups.len() - 1
            }
        };
        groups[index].2 += 1;
        if let Some(value) = as_number(row.get(agg_column)) {
            groups[index].1.push(value);
        }
    }

    groups
        .into_iter()
        .map(|(key, values, count)| {
            let value = match method {
                AggMethod::Count => json!(count),
                AggMethod::Sum => json!(values.iter().sum::<f64>()),
                AggMethod::Avg if values.is_empty() => Value::Null,
                AggMethod::Avg => json!(values.iter().sum::<f64>() / values.len() as f64),
                AggMethod::Min => values
                    .iter()
                    .copied()
                    .reduce(f64::min)
                    .map_or(Value::Null, |v| json!(v)),
                AggMethod::Max => values
                    .iter()
                    .copied()
                    .reduce(f64::max)
                    .map_or(Value::Null, |v| json!(v)),
            };
            let mut row = Row::new();
            row.insert(group_by.to_string(), Value::String(key));
            row.insert(agg_column.to_string(), value);
            row
        })
        .collect()
}

pub fn to_rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

/// Small sales table used across scenarios
pub fn sales() -> Vec<Row> {
    to_rows(vec![
        json!({"product": "A", "city": "Delhi", "segment": "Retail", "sales": 10}),
        json!({"product": "A", "city": "Pune", "segment": "Wholesale", "sales": 20}),
        json!({"product": "B", "city": "Delhi", "segment": "Wholesale", "sales": 20}),
        json!({"product": "C", "city": "Bangalore", "segment": "Retail", "sales": 100}),
        json!({"product": "C", "city": "Bengaluru", "segment": "Retail", "sales": 8}),
    ])
}
