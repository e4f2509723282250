//! Cache and adaptive-timeout benchmarks.
//!
//! Run with:
//!   cargo bench --bench performance_cache

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glimpse::services::performance::{draft_key, AdaptiveTimeout, PerformanceCache};
use glimpse::{Draft, TimeoutConfig};

fn drafts(n: usize) -> Vec<Draft> {
    (0..n)
        .map(|i| {
            Draft::new(
                format!("Refactor handler {i} to   handle None safely"),
                "preserve return schema",
                "Don't change the schema | no new dependencies",
            )
        })
        .collect()
}

fn bench_key(c: &mut Criterion) {
    let draft = &drafts(1)[0];
    c.bench_function("draft_key", |b| b.iter(|| draft_key(black_box(draft))));
}

fn bench_cache(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let mut group = c.benchmark_group("performance_cache");

    for size in [100_usize, 1000] {
        let inputs = drafts(size);
        group.bench_with_input(BenchmarkId::new("set_then_get", size), &inputs, |b, inputs| {
            b.to_async(&runtime).iter(|| async {
                let cache = PerformanceCache::new(size / 2, Duration::from_secs(3600));
                for (i, draft) in inputs.iter().enumerate() {
                    cache.set(draft, i).await;
                }
                for draft in inputs {
                    black_box(cache.get(draft).await);
                }
            });
        });
    }
    group.finish();
}

fn bench_timeout(c: &mut Criterion) {
    c.bench_function("adaptive_timeout_record", |b| {
        let mut timeout = AdaptiveTimeout::new(TimeoutConfig::default());
        let mut ms = 0_u64;
        b.iter(|| {
            ms = (ms + 37) % 4000;
            timeout.record_latency(Duration::from_millis(ms));
            black_box(timeout.get_timeout())
        });
    });
}

criterion_group!(benches, bench_key, bench_cache, bench_timeout);
criterion_main!(benches);
