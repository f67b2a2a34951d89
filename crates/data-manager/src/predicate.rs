//! Filter predicate evaluation against a single row
//!
//! Evaluation is total: unknown columns read as missing, and a numeric
//! comparison that cannot parse either side excludes the row instead of
//! passing it.

use crate::values::{as_number, parse_number, stringify};
use crossfilter_shared::{FilterOperator, FilterRule, Row};

/// Evaluate one rule against one row
pub fn evaluate(rule: &FilterRule, row: &Row) -> bool {
    let cell = row.get(&rule.column);

    match rule.operator {
        FilterOperator::Eq => eq_ignore_case(&stringify(cell), &rule.value),
        FilterOperator::Neq => !eq_ignore_case(&stringify(cell), &rule.value),
        FilterOperator::Contains => contains_ignore_case(&stringify(cell), &rule.value),
        FilterOperator::NotContains => !contains_ignore_case(&stringify(cell), &rule.value),
        FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Gte | FilterOperator::Lte => {
            let (Some(lhs), Some(rhs)) = (as_number(cell), parse_number(&rule.value)) else {
                return false;
            };
            match rule.operator {
                FilterOperator::Gt => lhs > rhs,
                FilterOperator::Lt => lhs < rhs,
                FilterOperator::Gte => lhs >= rhs,
                _ => lhs <= rhs,
            }
        }
    }
}

/// AND-combination of `rules`; an empty rule list matches everything
pub fn matches_all(rules: &[FilterRule], row: &Row) -> bool {
    rules.iter().all(|rule| evaluate(rule, row))
}

/// Rows of `rows` that satisfy every rule, in their original order
pub fn apply_filters(rules: &[FilterRule], rows: &[Row]) -> Vec<Row> {
    rows.iter()
        .filter(|row| matches_all(rules, row))
        .cloned()
        .collect()
}

fn eq_ignore_case(lhs: &str, rhs: &str) -> bool {
    lhs.to_lowercase() == rhs.to_lowercase()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
