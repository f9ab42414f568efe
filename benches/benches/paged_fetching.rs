//! Benchmarks for the generic pager in paged mode at varying prefetch
//! depths.

use std::sync::OnceLock;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use range_fetcher::{PageFetcher, ProviderPolicy};
use range_fetcher_benches::paged_spec;

static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

fn get_runtime() -> &'static tokio::runtime::Runtime {
    RUNTIME.get_or_init(|| tokio::runtime::Runtime::new().expect("failed to create tokio runtime"))
}

const TOTAL_ITEMS: u64 = 50_000;

fn bench_prefetch_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("paged_fetching");
    group.throughput(Throughput::Elements(TOTAL_ITEMS));

    for prefetch in [1usize, 3, 8] {
        let spec = paged_spec(TOTAL_ITEMS).max_offset(1_000);
        let fetcher = PageFetcher::builder(ProviderPolicy::paged().prefetch(prefetch))
            .max_concurrent_fetches(8)
            .build()
            .expect("valid pager config");

        group.bench_with_input(
            BenchmarkId::new("prefetch", prefetch),
            &prefetch,
            |b, _| {
                b.iter(|| {
                    let outcome = get_runtime()
                        .block_on(fetcher.fetch_all(&spec, 0, Some(TOTAL_ITEMS)))
                        .expect("paged fetch failed");
                    assert_eq!(outcome.len() as u64, TOTAL_ITEMS);
                    outcome
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_prefetch_depth);
criterion_main!(benches);
