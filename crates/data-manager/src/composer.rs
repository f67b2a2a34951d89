//! Query composition
//!
//! Turns a chart definition plus its effective filter set into the request
//! contract understood by the remote aggregation engine. Composition is
//! pure; nothing here touches the network.

use crossfilter_shared::{
    AggMethod, ChartDefinition, FilterRule, LimitMode, QueryFilter, RemoteQueryRequest,
    SortDirection,
};

/// Row ceiling applied when the chart does not limit its result
pub const DEFAULT_ROW_LIMIT: u64 = 5000;

/// Builds remote query requests with a configurable row ceiling
#[derive(Debug, Clone, Copy)]
pub struct QueryComposer {
    row_limit: u64,
}

impl Default for QueryComposer {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

impl QueryComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_limit(row_limit: u64) -> Self {
        Self { row_limit }
    }

    pub fn row_limit(&self) -> u64 {
        self.row_limit
    }

    /// Compose the request for `definition` under `filters`
    pub fn compose(
        &self,
        definition: &ChartDefinition,
        filters: &[FilterRule],
    ) -> RemoteQueryRequest {
        let filters = filters.iter().map(QueryFilter::from).collect();

        // Only pivot mode aggregates; an agg method alone does not
        let (group_by, agg_column, agg_method) = if definition.is_pivot {
            (
                Some(definition.x_axis.clone()),
                Some(definition.y_axis.clone()),
                Some(definition.agg_method.unwrap_or(AggMethod::Sum)),
            )
        } else {
            (None, None, None)
        };

        let limit = if definition.limit.enabled {
            definition.limit.value.max(0.0).floor() as u64
        } else {
            self.row_limit
        };

        let (sort_by, sort_direction) = match sort_direction(definition) {
            Some(direction) => (Some(definition.y_axis.clone()), Some(direction)),
            None => (None, None),
        };

        let request = RemoteQueryRequest {
            filters,
            group_by,
            agg_column,
            agg_method,
            limit,
            sort_by,
            sort_direction,
        };

        log::debug!(
            "Composed query: {} filters, group_by={:?}, limit={}, sort={:?}",
            request.filters.len(),
            request.group_by,
            request.limit,
            request.sort_direction
        );

        request
    }
}

/// Compose with the default row ceiling
pub fn compose(definition: &ChartDefinition, filters: &[FilterRule]) -> RemoteQueryRequest {
    QueryComposer::default().compose(definition, filters)
}

/// Server-side ordering, present only for ranked limits on charts whose
/// y values are comparable aggregates
fn sort_direction(definition: &ChartDefinition) -> Option<SortDirection> {
    if !definition.limit.is_ranked() {
        return None;
    }

    let aggregated = definition.is_pivot
        || (!definition.x_axis.is_empty() && definition.agg_method.is_some());
    if !aggregated {
        return None;
    }

    match definition.limit.mode {
        LimitMode::Top => Some(SortDirection::Desc),
        LimitMode::Bottom => Some(SortDirection::Asc),
        LimitMode::Gt | LimitMode::Lt => None,
    }
}
