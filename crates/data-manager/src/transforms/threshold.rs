//! Value-threshold limits (`gt` / `lt` limit modes)

use crate::values::as_number;
use crossfilter_shared::{ChartDefinition, LimitMode, Row};

/// Keep rows whose y value is strictly above (`gt`) or below (`lt`) the
/// configured limit value. Rows without a numeric y value are dropped.
/// Ranked or disabled limits leave the rows untouched.
pub fn apply_threshold(definition: &ChartDefinition, rows: Vec<Row>) -> Vec<Row> {
    if !definition.limit.is_threshold() {
        return rows;
    }

    let threshold = definition.limit.value;
    let mode = definition.limit.mode;
    rows.into_iter()
        .filter(|row| match as_number(row.get(&definition.y_axis)) {
            Some(value) if mode == LimitMode::Gt => value > threshold,
            Some(value) => value < threshold,
            None => false,
        })
        .collect()
}
