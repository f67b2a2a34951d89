//! Client-side statistical transforms applied to rows returned by the
//! remote query service.

pub mod histogram;
pub mod outliers;
pub mod reference;
pub mod threshold;

pub use histogram::{bin_histogram, histogram_rows, HistogramBin, HISTOGRAM_BIN_COUNT};
pub use outliers::{detect_outliers, IqrBounds, OutlierPartition, MIN_OUTLIER_SAMPLE};
pub use reference::{average, median, reference_lines, ReferenceLines};
pub use threshold::apply_threshold;

/// Ascending copy of `values`
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
