//! Benchmarks for the client-side transforms

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossfilter_data::{apply_filters, bin_histogram, detect_outliers, median};
use crossfilter_shared::{FilterOperator, FilterRule, Row};
use serde_json::json;

fn generate_rows(count: usize) -> Vec<Row> {
    (0..count)
        .filter_map(|i| {
            json!({
                "city": if i % 3 == 0 { "Bangalore" } else { "Delhi" },
                "sales": (i * 7919 % 1000) as f64 / 3.0,
            })
            .as_object()
            .cloned()
        })
        .collect()
}

fn bench_filters(c: &mut Criterion) {
    let rows = generate_rows(5000);
    let rules = vec![
        FilterRule::new("a", "city", FilterOperator::Contains, "ban"),
        FilterRule::new("b", "sales", FilterOperator::Gte, "100"),
    ];

    let mut group = c.benchmark_group("apply_filters");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("5k_rows_2_rules", |b| {
        b.iter(|| black_box(apply_filters(black_box(&rules), black_box(&rows))));
    });
    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let rows = generate_rows(5000);
    let values: Vec<f64> = (0..5000).map(|i| (i * 31 % 997) as f64).collect();

    c.bench_function("detect_outliers_5k", |b| {
        b.iter(|| black_box(detect_outliers("sales", black_box(&rows))));
    });
    c.bench_function("bin_histogram_5k", |b| {
        b.iter(|| black_box(bin_histogram("sales", black_box(&rows))));
    });
    c.bench_function("median_5k", |b| {
        b.iter(|| black_box(median(black_box(&values))));
    });
}

criterion_group!(benches, bench_filters, bench_statistics);
criterion_main!(benches);
