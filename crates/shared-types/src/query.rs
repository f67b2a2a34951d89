//! Remote aggregation query contract
//!
//! These structs are the exact JSON shape exchanged with the external
//! query service. Optional fields are omitted from the request body when
//! unset so the server applies its own defaults.

use crate::{AggMethod, FilterOperator, FilterRule, Row};
use serde::{Deserialize, Serialize};

/// One filter as sent over the wire (rule ids stay client-side)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl From<&FilterRule> for QueryFilter {
    fn from(rule: &FilterRule) -> Self {
        Self {
            column: rule.column.clone(),
            operator: rule.operator,
            value: rule.value.clone(),
        }
    }
}

/// Sort order requested from the server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Aggregation request issued to the remote engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteQueryRequest {
    pub filters: Vec<QueryFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_method: Option<AggMethod>,
    pub limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

impl RemoteQueryRequest {
    pub fn is_aggregated(&self) -> bool {
        self.group_by.is_some()
    }
}

/// Response body of the remote engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Vec<Row>,
}

impl QueryResponse {
    pub fn new(data: Vec<Row>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unaggregated_request_omits_optional_fields() {
        let request = RemoteQueryRequest {
            filters: vec![],
            group_by: None,
            agg_column: None,
            agg_method: None,
            limit: 5000,
            sort_by: None,
            sort_direction: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(json["limit"], 5000);
        assert!(json["filters"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_response_without_data_defaults_to_empty() {
        let response: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.is_empty());
    }
}
