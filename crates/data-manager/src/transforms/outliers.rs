//! IQR outlier detection
//!
//! Quartiles are rank-based (`sorted[floor(n * p)]`), not interpolated.
//! The detector only partitions rows; whether outliers are hidden or drawn
//! as an overlay is up to the caller.

use super::sorted;
use crate::values::{as_number, numeric_column};
use crossfilter_shared::Row;
use serde::{Deserialize, Serialize};

/// Fewer numeric values than this and no row is flagged
pub const MIN_OUTLIER_SAMPLE: usize = 5;

const FENCE_FACTOR: f64 = 1.5;

/// Inclusive fences derived from the interquartile range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Split of the input rows; together they hold every input row exactly once
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlierPartition {
    pub normal: Vec<Row>,
    pub outliers: Vec<Row>,
    pub bounds: Option<IqrBounds>,
}

impl OutlierPartition {
    pub fn len(&self) -> usize {
        self.normal.len() + self.outliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the fences for `values`, or `None` below the minimum sample size
pub fn iqr_bounds(values: &[f64]) -> Option<IqrBounds> {
    let n = values.len();
    if n < MIN_OUTLIER_SAMPLE {
        return None;
    }

    let sorted = sorted(values);
    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[(n as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;

    Some(IqrBounds {
        q1,
        q3,
        lower: q1 - FENCE_FACTOR * iqr,
        upper: q3 + FENCE_FACTOR * iqr,
    })
}

/// Partition `rows` by the IQR fences of `column`. Rows whose cell is not
/// numeric cannot be judged and stay in `normal`.
pub fn detect_outliers(column: &str, rows: &[Row]) -> OutlierPartition {
    let Some(bounds) = iqr_bounds(&numeric_column(column, rows)) else {
        return OutlierPartition {
            normal: rows.to_vec(),
            outliers: Vec::new(),
            bounds: None,
        };
    };

    let (normal, outliers): (Vec<Row>, Vec<Row>) = rows.iter().cloned().partition(|row| {
        as_number(row.get(column)).map_or(true, |value| bounds.contains(value))
    });

    log::debug!(
        "Outliers on '{}': {} of {} rows outside [{}, {}]",
        column,
        outliers.len(),
        rows.len(),
        bounds.lower,
        bounds.upper
    );

    OutlierPartition {
        normal,
        outliers,
        bounds: Some(bounds),
    }
}
