//! Benchmarks for workflow execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use stepwise::executor::Executor;
use stepwise::steps::Step;

fn noop(name: String) -> Step<String> {
    Step::new(name, |_ctx| async { Ok(json!(null)) })
}

fn sequential_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("sequential");
    for stages in [1_usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(stages), &stages, |b, &stages| {
            b.iter(|| {
                runtime.block_on(async {
                    let mut executor = Executor::new();
                    for i in 0..stages {
                        executor.next(noop(format!("s{i}"))).unwrap();
                    }
                    black_box(executor.run().await.unwrap())
                })
            });
        });
    }
    group.finish();
}

fn fan_out_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("fan_out");
    for width in [1_usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                runtime.block_on(async {
                    let mut executor = Executor::new();
                    executor
                        .fan_out((0..width).map(|i| noop(format!("p{i}"))))
                        .unwrap();
                    black_box(executor.run().await.unwrap())
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, sequential_benchmark, fan_out_benchmark);
criterion_main!(benches);
