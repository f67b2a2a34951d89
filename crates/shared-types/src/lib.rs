//! Shared types for the cross-filtering pipeline
//!
//! This crate contains every type that crosses a crate boundary: the chart
//! and filter data model, the remote query contract, the error taxonomy and
//! the coordination store snapshot. Everything here serializes with serde so
//! saved widget configurations can be persisted and read back unchanged.

pub mod errors;
pub mod query;
pub mod store_state;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use errors::{ErrorResponse, PipelineError, PipelineResult};
pub use query::{QueryFilter, QueryResponse, RemoteQueryRequest, SortDirection};
pub use store_state::{StateChangeDetection, StoreSnapshot};

/// A single data row: flat column -> value map
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Click selection inside one widget: column -> selected value
pub type Selection = BTreeMap<String, String>;

/// Identity of a dashboard widget
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Comparison operators a filter rule can use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    NotContains,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
        }
    }

    /// Operators that compare both sides as numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Gte | FilterOperator::Lte
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filter predicate. Rules are replaced wholesale, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilterRule {
    pub id: String,
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterRule {
    pub fn new(
        id: impl Into<String>,
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Chart types a widget can be configured with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Area,
    Scatter,
    Histogram,
    Pie,
    Donut,
}

/// Aggregation applied by the remote engine in pivot mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AggMethod {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggMethod::Sum => "sum",
            AggMethod::Avg => "avg",
            AggMethod::Count => "count",
            AggMethod::Min => "min",
            AggMethod::Max => "max",
        }
    }
}

/// How the configured limit value is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LimitMode {
    #[default]
    Top,
    Bottom,
    Gt,
    Lt,
}

/// Limit/sort policy of a chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LimitConfig {
    pub enabled: bool,
    pub mode: LimitMode,
    pub value: f64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: LimitMode::Top,
            value: 10.0,
        }
    }
}

impl LimitConfig {
    pub fn top(value: f64) -> Self {
        Self {
            enabled: true,
            mode: LimitMode::Top,
            value,
        }
    }

    pub fn bottom(value: f64) -> Self {
        Self {
            enabled: true,
            mode: LimitMode::Bottom,
            value,
        }
    }

    /// True when the limit asks the server to sort and truncate
    pub fn is_ranked(&self) -> bool {
        self.enabled && matches!(self.mode, LimitMode::Top | LimitMode::Bottom)
    }

    /// True when the limit is a value threshold on the y axis
    pub fn is_threshold(&self) -> bool {
        self.enabled && matches!(self.mode, LimitMode::Gt | LimitMode::Lt)
    }
}

/// Complete chart definition as configured in the chart builder and
/// persisted when a widget is saved or pinned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
    #[serde(default)]
    pub is_pivot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_method: Option<AggMethod>,
    #[serde(default)]
    pub limit: LimitConfig,
    #[serde(default)]
    pub show_average: bool,
    #[serde(default)]
    pub show_median: bool,
    #[serde(default)]
    pub show_outliers: bool,
    #[serde(default)]
    pub saved_filters: Vec<FilterRule>,
}

impl ChartDefinition {
    pub fn new(
        chart_type: ChartType,
        x_axis: impl Into<String>,
        y_axis: impl Into<String>,
    ) -> Self {
        Self {
            chart_type,
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            ..Default::default()
        }
    }

    /// Switch the chart to a grouped/aggregated query
    pub fn pivot(mut self, method: AggMethod) -> Self {
        self.is_pivot = true;
        self.agg_method = Some(method);
        self
    }

    pub fn with_limit(mut self, limit: LimitConfig) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_saved_filters(mut self, filters: Vec<FilterRule>) -> Self {
        self.saved_filters = filters;
        self
    }
}
