use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use autopay::prelude::*;
use tokio::runtime::Runtime;

/// Executor that accepts every item and answers immediately
#[derive(Debug)]
struct Echo;

#[async_trait]
impl BatchExecutor for Echo {
    type Item = u64;
    type Response = u64;
    type Error = String;

    fn validate(&self, _item: &u64) -> Result<(), String> {
        Ok(())
    }

    async fn execute(&self, _ctx: &Context, item: &u64) -> Result<u64, String> {
        Ok(*item)
    }
}

/// Dispatcher overhead per batch size with no gate in the way
fn bench_unthrottled_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("unthrottled_dispatch");
    let runtime = Runtime::new().unwrap();
    let dispatcher = BatchDispatcher::new(Arc::new(Echo), Unthrottled::shared());

    for size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&runtime).iter(|| async {
                let summary = dispatcher
                    .dispatch(&Context::new(), (0..size).collect(), 10)
                    .await
                    .unwrap();
                black_box(summary.success_count)
            });
        });
    }

    group.finish();
}

/// Effect of the concurrency bound on a fixed batch
fn bench_concurrency_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrency_levels");
    let runtime = Runtime::new().unwrap();
    let dispatcher = BatchDispatcher::new(Arc::new(Echo), Unthrottled::shared());

    for workers in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.to_async(&runtime).iter(|| async {
                let summary = dispatcher
                    .dispatch(&Context::new(), (0..1_000).collect(), workers)
                    .await
                    .unwrap();
                black_box(summary.success_count)
            });
        });
    }

    group.finish();
}

/// Cost of passing the token bucket when it never has to wait
fn bench_gate_admission(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let gate = RateGate::shared(NonZeroU32::MAX, NonZeroU32::MAX);
    let ctx = Context::new();

    c.bench_function("gate_admission", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(gate.wait(&ctx).await.is_ok())
        });
    });
}

criterion_group!(
    benches,
    bench_unthrottled_dispatch,
    bench_concurrency_levels,
    bench_gate_admission
);
criterion_main!(benches);
