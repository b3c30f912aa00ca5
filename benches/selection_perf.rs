//! Criterion benchmarks for arm selection and posterior-predictive summaries.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use thompson::{BernoulliExperiment, ExponentialExperiment, Outcome, PoissonExperiment};

// =============================================================================
// Selection Benchmarks
// =============================================================================

fn selection_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("choose_arm");

    for arms in [2usize, 10, 100] {
        let exp = BernoulliExperiment::with_arms(arms).unwrap();
        group.throughput(Throughput::Elements(arms as u64));
        group.bench_function(format!("bernoulli_{arms}_arms"), |b| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| black_box(exp.choose_arm_with_rng(&mut rng).unwrap()));
        });
    }

    let mut exp = PoissonExperiment::with_arms(10).unwrap();
    exp.add_rewards(&[Outcome::new("option3", 12.0), Outcome::new("option7", 4.0)])
        .unwrap();
    group.bench_function("poisson_10_arms", |b| {
        let mut rng = StdRng::seed_from_u64(2);
        b.iter(|| black_box(exp.choose_arm_with_rng(&mut rng).unwrap()));
    });

    group.finish();
}

// =============================================================================
// Update Benchmarks
// =============================================================================

fn update_benchmarks(c: &mut Criterion) {
    let outcomes: Vec<_> = (0..1_000)
        .map(|i| Outcome::new(format!("option{}", i % 5 + 1), f64::from(i % 2)))
        .collect();
    let mut group = c.benchmark_group("add_rewards");
    group.throughput(Throughput::Elements(outcomes.len() as u64));
    group.bench_function("bernoulli_batch_1000", |b| {
        b.iter(|| {
            let mut exp = BernoulliExperiment::with_arms(5).unwrap();
            exp.add_rewards(black_box(&outcomes)).unwrap();
            black_box(exp.posteriors().len())
        });
    });
    group.finish();
}

// =============================================================================
// PPD Benchmarks
// =============================================================================

fn ppd_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_ppd");
    group.sample_size(20);

    let bernoulli = BernoulliExperiment::with_arms(3).unwrap();
    group.bench_function("bernoulli_3x10000", |b| {
        let mut rng = StdRng::seed_from_u64(3);
        b.iter(|| black_box(bernoulli.get_ppd_with_rng(10_000, &mut rng).unwrap()));
    });

    let mut exponential = ExponentialExperiment::with_arms(3).unwrap();
    exponential
        .add_rewards(&[Outcome::new("option1", 1.5), Outcome::new("option2", 0.2)])
        .unwrap();
    group.bench_function("exponential_3x10000", |b| {
        let mut rng = StdRng::seed_from_u64(4);
        b.iter(|| black_box(exponential.get_ppd_with_rng(10_000, &mut rng).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    selection_benchmarks,
    update_benchmarks,
    ppd_benchmarks
);
criterion_main!(benches);
