//! Numerical fit benchmarks.
//!
//! Measures closed-form selection across example counts and data shapes.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tabulax::{ExampleSet, NumericalSynthesizer};

fn generate_examples(n: usize, f: impl Fn(f64) -> f64) -> ExampleSet {
    let pairs: Vec<(String, String)> = (0..n)
        .map(|i| {
            let x = i as f64 * 0.5 + 1.0;
            (x.to_string(), f(x).to_string())
        })
        .collect();
    ExampleSet::from_pairs(pairs)
}

/// Benchmark the full four-family fit on different data shapes.
fn bench_fit_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_shape");
    let synthesizer = NumericalSynthesizer::new();

    let shapes: [(&str, fn(f64) -> f64); 4] = [
        ("linear", |x| 1.8 * x + 32.0),
        ("quadratic", |x| 0.5 * x * x - x + 2.0),
        ("exponential", |x| 3.0 * (0.4 * x).exp()),
        ("rational", |x| (2.0 * x + 1.0) / (x + 4.0)),
    ];

    for (name, f) in shapes.iter() {
        let examples = generate_examples(10, f);
        group.bench_with_input(BenchmarkId::from_parameter(name), &examples, |b, examples| {
            b.iter(|| black_box(synthesizer.fit(examples).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark how the fit scales with the number of examples.
fn bench_fit_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_scaling");
    let synthesizer = NumericalSynthesizer::new();

    for n in [5, 20, 100].iter() {
        let examples = generate_examples(*n, |x| 0.5 * x * x - x + 2.0);
        group.bench_with_input(BenchmarkId::new("examples", n), &examples, |b, examples| {
            b.iter(|| black_box(synthesizer.fit(examples).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit_shapes, bench_fit_scaling);
criterion_main!(benches);
