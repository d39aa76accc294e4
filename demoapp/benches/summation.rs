use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use demoapp::{
    estimate_volume_parallel, estimate_volume_serial, phantom_slice, run_parallel, run_sequential,
    JobConfig, Strategy,
};

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_below");
    for ops in [1_000i64, 100_000, 1_000_000] {
        for strategy in Strategy::ALL {
            group.bench_with_input(BenchmarkId::new(strategy.name(), ops), &ops, |b, &ops| {
                b.iter(|| strategy.apply(black_box(ops)))
            });
        }
    }
    group.finish();
}

fn bench_job_modes(c: &mut Criterion) {
    let config = JobConfig::new(16, 200_000);
    let mut group = c.benchmark_group("jobs");
    group.bench_function("sequential", |b| b.iter(|| run_sequential(black_box(&config))));
    group.bench_function("parallel", |b| b.iter(|| run_parallel(black_box(&config))));
    group.finish();
}

fn bench_volume(c: &mut Criterion) {
    let slices: Vec<_> = (0..8).map(|_| phantom_slice(128, 30)).collect();
    let mut group = c.benchmark_group("volume");
    group.bench_function("serial", |b| b.iter(|| estimate_volume_serial(black_box(&slices), 50.0)));
    group.bench_function("parallel", |b| {
        b.iter(|| estimate_volume_parallel(black_box(&slices), 50.0))
    });
    group.finish();
}

criterion_group!(benches, bench_strategies, bench_job_modes, bench_volume);
criterion_main!(benches);
