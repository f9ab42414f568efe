use std::time::Duration;

/// Per-run counters reported by both fetch engines.
///
/// A fresh `RunStats` is created for every `fetch_all` invocation and
/// returned by value inside [`FetchOutcome`]; nothing is persisted across
/// calls. Range-prefixed counters are only touched by the splitter, page
/// counters only by the pager.
///
/// Callers of [`RangeSplitter::fetch_all`][splitter] must inspect
/// [`ranges_failed`](RunStats::ranges_failed) and
/// [`ranges_saturated_at_floor`](RunStats::ranges_saturated_at_floor) to
/// detect partial results: the splitter deliberately returns `Ok` with an
/// incomplete item set rather than failing a bulk backfill outright.
///
/// [splitter]: crate::RangeSplitter::fetch_all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Sub-ranges pushed onto the pending heap, including re-enqueued
    /// retries and split halves.
    pub ranges_seeded: u64,
    /// Sub-range fetches that completed (successfully or not).
    pub ranges_processed: u64,
    /// Saturated sub-ranges that were split into two halves.
    pub ranges_split: u64,
    /// Sub-ranges re-enqueued after a fetch error.
    pub ranges_retried: u64,
    /// Sub-ranges dropped after exhausting their attempt budget. Their items
    /// are missing from the result.
    pub ranges_failed: u64,
    /// Sub-ranges accepted while still saturated because they already sat at
    /// the minimum width. Their data may be truncated by the provider cap.
    pub ranges_saturated_at_floor: u64,
    /// Pages fetched by the pager.
    pub pages_processed: u64,
    /// Items received from the provider before deduplication.
    pub items_fetched: u64,
    /// Items in the final, deduplicated result.
    pub items_returned: u64,
    /// Items dropped because the key function returned no key.
    pub items_dropped_no_key: u64,
    /// Items dropped as duplicates of an earlier item with the same key.
    pub duplicates_removed: u64,
    /// End bound used for the run, after resolution (pager only).
    pub resolved_end_block: Option<u64>,
    /// Wall-clock duration of the whole call.
    pub duration: Duration,
}

/// Result of a fetch run: the deduplicated, ordered items plus the counters
/// accumulated while producing them.
#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
    /// Deduplicated items, sorted ascending by the spec's order function.
    pub items: Vec<T>,
    /// Counters for this run.
    pub stats: RunStats,
}

impl<T> FetchOutcome<T> {
    pub(crate) fn empty(stats: RunStats) -> Self {
        Self { items: Vec::new(), stats }
    }

    /// Number of items in the result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the result is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any sub-range was permanently dropped or accepted while still
    /// saturated, i.e. whether the result may be incomplete.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.stats.ranges_failed > 0 || self.stats.ranges_saturated_at_floor > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_len_tracks_items() {
        let outcome = FetchOutcome { items: vec![1, 2, 3], stats: RunStats::default() };
        assert_eq!(outcome.len(), 3);
        assert!(!outcome.is_empty());
    }

    #[test]
    fn partial_flag_reflects_failed_ranges() {
        let mut stats = RunStats::default();
        assert!(!FetchOutcome::<u64>::empty(stats.clone()).is_partial());

        stats.ranges_failed = 1;
        assert!(FetchOutcome::<u64>::empty(stats.clone()).is_partial());

        stats.ranges_failed = 0;
        stats.ranges_saturated_at_floor = 2;
        assert!(FetchOutcome::<u64>::empty(stats).is_partial());
    }
}
