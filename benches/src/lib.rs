//! Benchmark utilities for range-fetcher performance testing.
//!
//! Provides synthetic in-memory providers so the benches measure engine
//! overhead (splitting, batching, dedup, ordering) rather than transport.

use range_fetcher::{FetchSpec, PageRequest, RangeSpec};

/// Encodes a (block, slot) pair as a single synthetic item.
fn item(block: u64, slot: u64) -> u64 {
    block * 16 + slot
}

/// Range provider with `items_per_block` items per block, truncating each
/// response at `cap` the way capped explorers do.
#[must_use]
pub fn uniform_range_spec(items_per_block: u64, cap: usize) -> RangeSpec<u64> {
    RangeSpec::new(
        "bench-range",
        move |start, end| {
            let mut items = Vec::new();
            'blocks: for block in start..=end {
                for slot in 0..items_per_block {
                    if items.len() >= cap {
                        break 'blocks;
                    }
                    items.push(item(block, slot));
                }
            }
            async move { Ok(items) }
        },
        |item: &u64| Some(item.to_string()),
        |item: &u64| Some((item / 16, item % 16)),
    )
}

/// Page provider serving `total_items` items in page-number order.
#[must_use]
pub fn paged_spec(total_items: u64) -> FetchSpec<u64> {
    FetchSpec::new(
        "bench-paged",
        move |request: PageRequest| {
            let offset = request.offset as u64;
            let first = (request.page - 1) * offset;
            let last = (first + offset).min(total_items);
            let items: Vec<u64> = (first..last).collect();
            async move { Ok(items) }
        },
        |item: &u64| Some(item.to_string()),
        |item: &u64| Some((*item, 0)),
    )
}
