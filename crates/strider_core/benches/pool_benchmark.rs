//! # Slot Pool Benchmark
//!
//! Measures the steady-state churn the streamer puts on a pool: one chunk
//! in, one chunk out, every few ticks, with the pool already warm.
//!
//! Run with: `cargo bench --package strider_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strider_core::{SharedPool, SlotPool};

/// Pool cap used by the streamer.
const MAX_POOL_SIZE: usize = 50;

/// Payload roughly the size of a chunk's bookkeeping.
#[derive(Clone, Default)]
struct Payload {
    start_z: f32,
    objects: Vec<u64>,
}

/// Benchmark: acquire/release churn on a warm pool.
fn bench_warm_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_churn");

    for live in [5, 25, MAX_POOL_SIZE] {
        group.bench_with_input(BenchmarkId::from_parameter(live), &live, |b, &live| {
            let mut pool: SlotPool<Payload> = SlotPool::new(MAX_POOL_SIZE);
            pool.prewarm(MAX_POOL_SIZE, |_| Payload::default());
            let mut held: Vec<_> = (0..live)
                .filter_map(|_| pool.acquire_with(|_| Payload::default()).ok())
                .map(|a| a.handle)
                .collect();

            b.iter(|| {
                let oldest = held.remove(0);
                pool.release(oldest).ok();
                if let Ok(a) = pool.acquire_with(|_| Payload::default()) {
                    if let Some(p) = pool.get_mut(a.handle) {
                        p.start_z += 20.0;
                        p.objects.clear();
                    }
                    held.push(a.handle);
                }
                black_box(pool.active_count())
            });
        });
    }

    group.finish();
}

/// Benchmark: exhausted acquire must stay cheap.
fn bench_exhausted(c: &mut Criterion) {
    let mut pool: SlotPool<Payload> = SlotPool::new(MAX_POOL_SIZE);
    for _ in 0..MAX_POOL_SIZE {
        pool.acquire_with(|_| Payload::default()).ok();
    }

    c.bench_function("acquire_exhausted", |b| {
        b.iter(|| black_box(pool.acquire_with(|_| Payload::default()).is_err()));
    });
}

/// Benchmark: same churn through the mutex wrapper.
fn bench_shared_churn(c: &mut Criterion) {
    let pool: SharedPool<Payload> = SharedPool::new(MAX_POOL_SIZE);
    pool.prewarm(MAX_POOL_SIZE, |_| Payload::default());

    c.bench_function("shared_acquire_release", |b| {
        b.iter(|| {
            if let Ok(a) = pool.acquire_with(|_| Payload::default()) {
                pool.release(a.handle).ok();
            }
            black_box(pool.active_count())
        });
    });
}

criterion_group!(benches, bench_warm_churn, bench_exhausted, bench_shared_churn);
criterion_main!(benches);
