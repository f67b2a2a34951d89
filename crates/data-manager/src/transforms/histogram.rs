//! Fixed-width histogram binning

use crate::values::numeric_column;
use crossfilter_shared::Row;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const HISTOGRAM_BIN_COUNT: usize = 10;

/// One histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// `"<low> - <high>"`, one decimal place
    pub label: String,
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

/// Bin the parseable values of `column` into ten equal-width buckets.
///
/// Non-numeric and missing values are dropped. A constant column falls back
/// to a step of 1. Returns no bins when nothing is parseable.
pub fn bin_histogram(column: &str, rows: &[Row]) -> Vec<HistogramBin> {
    let values = numeric_column(column, rows);
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = if max == min {
        1.0
    } else {
        (max - min) / HISTOGRAM_BIN_COUNT as f64
    };

    let mut counts = [0usize; HISTOGRAM_BIN_COUNT];
    for value in &values {
        let index = ((value - min) / step).floor();
        let index = index.clamp(0.0, (HISTOGRAM_BIN_COUNT - 1) as f64) as usize;
        counts[index] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let low = min + i as f64 * step;
            let high = low + step;
            HistogramBin {
                label: format!("{low:.1} - {high:.1}"),
                low,
                high,
                count,
            }
        })
        .collect()
}

/// Flatten bins into rows for the rendering boundary (`bin`, `count`)
pub fn histogram_rows(bins: &[HistogramBin]) -> Vec<Row> {
    bins.iter()
        .filter_map(|bin| {
            json!({ "bin": bin.label, "count": bin.count })
                .as_object()
                .cloned()
        })
        .collect()
}
