//! Benchmarks for the adaptive range splitter over capped synthetic
//! providers of varying width.

use std::sync::OnceLock;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use range_fetcher::RangeSplitter;
use range_fetcher_benches::uniform_range_spec;

static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn get_runtime() -> &'static tokio::runtime::Runtime {
    RUNTIME.get_or_init(|| tokio::runtime::Runtime::new().expect("failed to create tokio runtime"))
}

fn bench_split_backfill(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_splitting");

    for width in [10_000u64, 50_000, 100_000] {
        let spec = uniform_range_spec(2, 1_000);
        let splitter = RangeSplitter::builder(1_000)
            .min_range_width(10)
            .max_concurrent_fetches(8)
            .build()
            .expect("valid splitter config");

        group.throughput(Throughput::Elements(width));
        group.bench_with_input(BenchmarkId::new("width", width), &width, |b, &width| {
            b.iter(|| {
                let outcome = get_runtime()
                    .block_on(splitter.fetch_all(&spec, 0, width - 1))
                    .expect("backfill failed");
                assert!(!outcome.is_empty());
                outcome
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split_backfill);
criterion_main!(benches);
