//! Average and median reference lines

use super::sorted;
use crate::values::numeric_column;
use crossfilter_shared::{ChartDefinition, Row};
use serde::{Deserialize, Serialize};

/// Reference lines drawn across a chart's y axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceLines {
    pub average: Option<f64>,
    pub median: Option<f64>,
}

/// Arithmetic mean, `None` for an empty slice
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Lower median: `sorted[floor(n / 2)]`, never interpolated.
/// `[1, 2, 3, 4]` gives 2.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    Some(sorted[sorted.len() / 2])
}

/// Lines requested by `definition`, computed over its y axis
pub fn reference_lines(definition: &ChartDefinition, rows: &[Row]) -> ReferenceLines {
    if !definition.show_average && !definition.show_median {
        return ReferenceLines::default();
    }

    let values = numeric_column(&definition.y_axis, rows);
    ReferenceLines {
        average: if definition.show_average {
            average(&values)
        } else {
            None
        },
        median: if definition.show_median {
            median(&values)
        } else {
            None
        },
    }
}
