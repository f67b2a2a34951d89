//! Data crate for the cross-filtering pipeline
//! Predicate evaluation, query composition, remote fetching and the
//! client-side statistical transforms applied to returned rows.

pub mod composer;
pub mod fetcher;
pub mod predicate;
pub mod transforms;
pub mod values;

pub use composer::{compose, QueryComposer, DEFAULT_ROW_LIMIT};
pub use fetcher::{HttpQueryFetcher, QueryFetcher};
pub use predicate::{apply_filters, evaluate, matches_all};
pub use transforms::{
    apply_threshold, average, bin_histogram, detect_outliers, histogram_rows, median,
    reference_lines, HistogramBin, IqrBounds, OutlierPartition, ReferenceLines,
    HISTOGRAM_BIN_COUNT, MIN_OUTLIER_SAMPLE,
};
