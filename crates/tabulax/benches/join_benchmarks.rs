//! Fuzzy join benchmarks.
//!
//! The join compares every source row with every target row, so cost grows
//! with the product of the two table sizes.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};
use tabulax::{FuzzyJoinEngine, Record, TransformationCategory};

/// Generate name-like keys with small perturbations between the two sides.
fn generate_records(rows: usize, column: &str, perturb: bool) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            let mut name = format!("customer_{:05}", i);
            if perturb && i % 3 == 0 {
                name.replace_range(0..1, "k");
            }
            let mut record = Record::new();
            record.insert(column.to_string(), Value::String(name));
            record.insert("id".to_string(), json!(i));
            record
        })
        .collect()
}

fn generate_numeric(rows: usize, column: &str, offset: f64) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            let mut record = Record::new();
            record.insert(column.to_string(), json!(i as f64 * 1.5 + offset));
            record
        })
        .collect()
}

/// Benchmark the edit-distance join across table sizes.
fn bench_edit_distance_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_edit_distance");
    let engine = FuzzyJoinEngine::new(TransformationCategory::StringBased);

    for rows in [50, 200, 500].iter() {
        let source = generate_records(*rows, "name", false);
        let target = generate_records(*rows, "full_name", true);

        group.throughput(Throughput::Elements((*rows * *rows) as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), rows, |b, _| {
            b.iter(|| {
                black_box(
                    engine
                        .join(&source, &target, "name", "full_name", 2.0)
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

/// Benchmark the absolute-difference join.
fn bench_numeric_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_absolute_difference");
    let engine = FuzzyJoinEngine::new(TransformationCategory::Numerical);

    for rows in [100, 1_000].iter() {
        let source = generate_numeric(*rows, "price", 0.0);
        let target = generate_numeric(*rows, "amount", 0.2);

        group.throughput(Throughput::Elements((*rows * *rows) as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), rows, |b, _| {
            b.iter(|| black_box(engine.join(&source, &target, "price", "amount", 0.5).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark flattening join output into records.
fn bench_flatten(c: &mut Criterion) {
    let engine = FuzzyJoinEngine::new(TransformationCategory::StringBased);
    let source = generate_records(500, "name", false);
    let target = generate_records(500, "full_name", true);
    let output = engine
        .join(&source, &target, "name", "full_name", 2.0)
        .unwrap();

    c.bench_function("join_flatten_500", |b| b.iter(|| black_box(output.flatten())));
}

criterion_group!(
    benches,
    bench_edit_distance_join,
    bench_numeric_join,
    bench_flatten,
);
criterion_main!(benches);
