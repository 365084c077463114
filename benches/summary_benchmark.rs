//! Benchmark for the numeric and categorical summarizers
//!
//! Run with: cargo bench --bench summary_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use cohortstats::pipeline::{filter_outcome, summarize_categorical, summarize_numeric, OutcomeSubset};

/// Synthetic cohort: `n_numeric` float columns with ~5% nulls, `n_categorical`
/// text columns with 8 levels, and a 0/1 `outcome` column
fn generate_cohort(n_rows: usize, n_numeric: usize, n_categorical: usize, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let outcome: Vec<i32> = (0..n_rows)
        .map(|_| if rng.gen::<f64>() > 0.8 { 1 } else { 0 })
        .collect();
    let mut columns: Vec<Column> = vec![Column::new("outcome".into(), outcome)];

    for i in 0..n_numeric {
        let values: Vec<Option<f64>> = (0..n_rows)
            .map(|_| (rng.gen::<f64>() > 0.05).then(|| rng.gen::<f64>() * 200.0))
            .collect();
        columns.push(Column::new(format!("num_{}", i).into(), values));
    }

    for i in 0..n_categorical {
        let values: Vec<String> = (0..n_rows)
            .map(|_| format!("level_{}", rng.gen_range(0..8)))
            .collect();
        columns.push(Column::new(format!("cat_{}", i).into(), values));
    }

    DataFrame::new(columns).expect("Failed to create DataFrame")
}

fn benchmark_summaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("summaries");

    let sizes = [(1_000, 20), (10_000, 50), (50_000, 50)];

    for (n_rows, n_columns) in sizes {
        let df = generate_cohort(n_rows, n_columns, n_columns, 42);
        let numeric: Vec<String> = (0..n_columns).map(|i| format!("num_{}", i)).collect();
        let categorical: Vec<String> = (0..n_columns).map(|i| format!("cat_{}", i)).collect();
        group.throughput(Throughput::Elements((n_rows * n_columns) as u64));

        group.bench_with_input(
            BenchmarkId::new("numeric", format!("{}x{}", n_rows, n_columns)),
            &df,
            |b, df| b.iter(|| summarize_numeric(black_box(df), black_box(&numeric))),
        );

        group.bench_with_input(
            BenchmarkId::new("categorical", format!("{}x{}", n_rows, n_columns)),
            &df,
            |b, df| b.iter(|| summarize_categorical(black_box(df), black_box(&categorical))),
        );
    }

    group.finish();
}

fn benchmark_outcome_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("outcome_filter");

    for n_rows in [10_000, 100_000] {
        let df = generate_cohort(n_rows, 10, 0, 7);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(BenchmarkId::new("label_1", n_rows), &df, |b, df| {
            b.iter(|| filter_outcome(black_box(df), black_box("outcome"), OutcomeSubset::Label(1)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_summaries, benchmark_outcome_filter);
criterion_main!(benches);
