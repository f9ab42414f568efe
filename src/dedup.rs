//! Shared deduplication and ordering step.
//!
//! Both engines terminate into [`dedup_and_sort`]: first-seen-wins
//! deduplication under the spec's key function, then a stable ascending sort
//! under its order function. This step never fails an otherwise-successful
//! fetch: items without a resolvable key are dropped (they cannot be
//! deduplicated safely), and when any surviving item's sort key is
//! unresolvable the whole sort is skipped and insertion order kept.

use std::collections::HashSet;

use crate::{
    stats::RunStats,
    telemetry::Telemetry,
    types::{KeyFn, OrderFn},
};

/// Deduplicates and orders a fetched accumulator, updating the run counters.
///
/// The insertion-order fallback on an unresolvable sort key is a deliberate
/// policy, not error swallowing: a malformed record must not abort a fetch
/// that already paid for its provider calls. The fallback is surfaced through
/// a `sort_fallback` telemetry event and a warning log.
pub(crate) fn dedup_and_sort<T>(
    items: Vec<T>,
    key_fn: &KeyFn<T>,
    order_fn: &OrderFn<T>,
    stats: &mut RunStats,
    telemetry: &Telemetry,
) -> Vec<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut kept: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        match key_fn(&item) {
            Some(key) => {
                if seen.insert(key) {
                    kept.push(item);
                } else {
                    stats.duplicates_removed += 1;
                }
            }
            None => stats.items_dropped_no_key += 1,
        }
    }

    let order_keys: Option<Vec<(u64, u64)>> = kept.iter().map(|item| order_fn(item)).collect();
    match order_keys {
        Some(keys) => {
            let mut pairs: Vec<((u64, u64), T)> = keys.into_iter().zip(kept).collect();
            // sort_by_key is stable: equal keys keep their insertion order
            pairs.sort_by_key(|(key, _)| *key);
            kept = pairs.into_iter().map(|(_, item)| item).collect();
        }
        None => {
            warn!(item_count = kept.len(), "Unresolvable order key, keeping insertion order");
            telemetry.event("sort_fallback", &[("item_count", kept.len().to_string())]);
        }
    }

    stats.items_returned = kept.len() as u64;
    kept
}
