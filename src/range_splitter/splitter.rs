//! Adaptive range-splitting fetch engine.
//!
//! Some providers cap the number of items returned per call (commonly 1 000
//! or 10 000) and give no explicit signal when a response was truncated
//! rather than exhaustive for the requested interval: a saturated response
//! (item count at the cap) is the only observable truncation signal. This
//! module fetches an arbitrary `[start, end]` block range by recursively
//! splitting any sub-range that saturates, driven by a width-ordered
//! priority queue so the largest unknowns resolve first.
//!
//! # Split pivot
//!
//! When a provider returns more items than the configured cap, the local
//! item density is estimated from the response and the pivot is placed so
//! the left sub-range is expected to come in just under the cap (with a 15 %
//! safety margin). When the response saturated exactly at the cap the
//! density estimate is itself truncated and carries no information, so the
//! split falls back to bisection.
//!
//! # Failure semantics
//!
//! A sub-range whose fetch keeps failing after the per-call retry policy is
//! re-enqueued up to `max_attempts_per_range` times and then dropped,
//! counted in [`RunStats::ranges_failed`]. The call still returns `Ok` with
//! the items that were fetched: backfills prefer a partial result with an
//! honest accounting over an all-or-nothing failure. Inspect
//! [`FetchOutcome::is_partial`] or the stats to detect exclusions.

use std::{
    collections::{BinaryHeap, HashMap},
    sync::Arc,
    time::Instant,
};

use tokio::task::JoinSet;

use crate::{
    FetchError,
    dedup::dedup_and_sort,
    gate::CallGate,
    page_fetcher::DEFAULT_MAX_CONCURRENT_FETCHES,
    range_splitter::{RangeSpec, task::RangeTask},
    rate_limit::RateLimiter,
    retry::RetryPolicy,
    stats::{FetchOutcome, RunStats},
    telemetry::{Telemetry, TelemetrySink},
    types::{BlockNumber, CallResult},
};

/// Default floor below which a sub-range is never split further.
pub const DEFAULT_MIN_RANGE_WIDTH: u64 = 100;

/// Default number of whole-range attempts before a sub-range is dropped.
pub const DEFAULT_MAX_ATTEMPTS_PER_RANGE: u32 = 3;

/// Maximum span in blocks of an edge-kickoff fetch.
pub const EDGE_KICKOFF_MAX_SPAN: u64 = 50_000;

/// Safety margin applied to the density-driven pivot so the left half is
/// expected to land under the cap, not at it.
const SPLIT_SAFETY_MARGIN: f64 = 1.15;

/// Builder for [`RangeSplitter`].
#[derive(Clone)]
pub struct RangeSplitterBuilder {
    max_offset: usize,
    max_concurrent: usize,
    min_range_width: u64,
    max_attempts_per_range: u32,
    edges_first: bool,
    rps_key: Option<String>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry: Option<RetryPolicy>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl RangeSplitterBuilder {
    /// Creates a builder for a provider whose per-call item cap is
    /// `max_offset`.
    #[must_use]
    pub fn new(max_offset: usize) -> Self {
        Self {
            max_offset,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            min_range_width: DEFAULT_MIN_RANGE_WIDTH,
            max_attempts_per_range: DEFAULT_MAX_ATTEMPTS_PER_RANGE,
            edges_first: true,
            rps_key: None,
            rate_limiter: None,
            retry: None,
            telemetry: None,
        }
    }

    /// Sets the maximum number of range fetches in flight at once.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn max_concurrent_fetches(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Sets the width floor below which a sub-range is never split, even if
    /// it still saturates the provider cap.
    ///
    /// This is a liveness floor, not a completeness guarantee: a range
    /// accepted at the floor may still be truncated. Such acceptances are
    /// counted in [`RunStats::ranges_saturated_at_floor`].
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn min_range_width(mut self, min_range_width: u64) -> Self {
        self.min_range_width = min_range_width;
        self
    }

    /// Sets how many times a failing sub-range is attempted before it is
    /// dropped from the result.
    ///
    /// This budget is independent of (and layered on top of) the injected
    /// [`RetryPolicy`]: the retry policy re-runs a single call on transient
    /// errors; this budget decides when to give up on the range entirely.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn max_attempts_per_range(mut self, max_attempts_per_range: u32) -> Self {
        self.max_attempts_per_range = max_attempts_per_range;
        self
    }

    /// Enables or disables the edge-first kickoff (enabled by default).
    ///
    /// When enabled, both boundary sub-ranges of the overall range are
    /// fetched before the (usually largest) center range, front-loading the
    /// typically dense boundary activity and shortening the critical path
    /// versus center-out splitting.
    #[must_use]
    pub fn edges_first(mut self, edges_first: bool) -> Self {
        self.edges_first = edges_first;
        self
    }

    /// Sets the rate-limit bucket for this provider.
    #[must_use]
    pub fn rps_key(mut self, rps_key: impl Into<String>) -> Self {
        self.rps_key = Some(rps_key.into());
        self
    }

    /// Injects a caller-owned rate limiter; calls are throttled under the
    /// configured `rps_key`.
    #[must_use]
    pub fn rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Injects a retry policy wrapping every range call.
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Injects a telemetry sink for lifecycle events.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Validates the configuration and builds the splitter.
    ///
    /// # Errors
    ///
    /// * [`FetchError::InvalidMaxOffset`] if `max_offset` is zero.
    /// * [`FetchError::InvalidMaxConcurrent`] if `max_concurrent_fetches` is
    ///   zero.
    /// * [`FetchError::InvalidMinRangeWidth`] if `min_range_width` is zero.
    /// * [`FetchError::InvalidMaxAttempts`] if `max_attempts_per_range` is
    ///   zero.
    pub fn build(self) -> Result<RangeSplitter, FetchError> {
        if self.max_offset == 0 {
            return Err(FetchError::InvalidMaxOffset);
        }
        if self.max_concurrent == 0 {
            return Err(FetchError::InvalidMaxConcurrent);
        }
        if self.min_range_width == 0 {
            return Err(FetchError::InvalidMinRangeWidth);
        }
        if self.max_attempts_per_range == 0 {
            return Err(FetchError::InvalidMaxAttempts);
        }
        Ok(RangeSplitter {
            max_offset: self.max_offset,
            max_concurrent: self.max_concurrent,
            min_range_width: self.min_range_width,
            max_attempts_per_range: self.max_attempts_per_range,
            edges_first: self.edges_first,
            rps_key: self.rps_key,
            rate_limiter: self.rate_limiter,
            retry: self.retry,
            telemetry: Telemetry::new(self.telemetry),
        })
    }
}

/// Adaptive range splitter for providers with an absolute per-call item cap.
///
/// See the [module docs](self) for the algorithm and failure semantics.
pub struct RangeSplitter {
    max_offset: usize,
    max_concurrent: usize,
    min_range_width: u64,
    max_attempts_per_range: u32,
    edges_first: bool,
    rps_key: Option<String>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry: Option<RetryPolicy>,
    telemetry: Telemetry,
}

/// Mutable state of one `fetch_all` invocation. Lives only for the duration
/// of the call.
struct RunState<T> {
    heap: BinaryHeap<RangeTask>,
    next_seq: u64,
    attempts: HashMap<(BlockNumber, BlockNumber), u32>,
    items: Vec<T>,
    stats: RunStats,
}

impl<T> RunState<T> {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            attempts: HashMap::new(),
            items: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Allocates the next task sequence number, counting the range as
    /// seeded work.
    fn task(&mut self, start: BlockNumber, end: BlockNumber) -> RangeTask {
        let task = RangeTask::new(self.next_seq, start, end);
        self.next_seq += 1;
        self.stats.ranges_seeded += 1;
        task
    }

    /// Enqueues `[start, end]`; inverted intervals are discarded so no
    /// sub-range is ever dispatched with `end < start`.
    fn push_range(&mut self, start: BlockNumber, end: BlockNumber) {
        if end < start {
            return;
        }
        let task = self.task(start, end);
        self.heap.push(task);
    }
}

impl RangeSplitter {
    /// Creates a builder for a provider whose per-call item cap is
    /// `max_offset`.
    #[must_use]
    pub fn builder(max_offset: usize) -> RangeSplitterBuilder {
        RangeSplitterBuilder::new(max_offset)
    }

    /// Fetches every item of `spec` within `[start_block, end_block]`.
    ///
    /// An end bound at or below `start_block` yields an empty outcome with
    /// zero provider calls. Provider failures are absorbed per sub-range and
    /// reported through the returned [`RunStats`]; the call itself only
    /// fails if a fetch task dies outside the provider call (e.g. a panic in
    /// a callback).
    ///
    /// # Errors
    ///
    /// * [`FetchError::Provider`] wrapping a join failure of an internal
    ///   fetch task.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub async fn fetch_all<T: Send + 'static>(
        &self,
        spec: &RangeSpec<T>,
        start_block: BlockNumber,
        end_block: BlockNumber,
    ) -> Result<FetchOutcome<T>, FetchError> {
        let started = Instant::now();
        let mut state = RunState::new();

        if end_block <= start_block {
            debug!(
                spec = spec.name(),
                start_block = start_block,
                end_block = end_block,
                "Empty block range, nothing to fetch"
            );
            state.stats.duration = started.elapsed();
            return Ok(FetchOutcome::empty(state.stats));
        }

        info!(
            spec = spec.name(),
            start_block = start_block,
            end_block = end_block,
            max_offset = self.max_offset,
            edges_first = self.edges_first,
            "Starting adaptive range fetch"
        );

        let gate = Arc::new(CallGate::new(
            self.max_concurrent,
            self.rate_limiter.clone(),
            self.rps_key.clone(),
            self.retry.clone(),
        ));

        if self.edges_first {
            self.kickoff_edges(spec, &gate, &mut state, start_block, end_block).await;
        } else {
            state.push_range(start_block, end_block);
        }

        while !state.heap.is_empty() {
            let mut set: JoinSet<(RangeTask, CallResult<T>)> = JoinSet::new();
            for _ in 0..self.max_concurrent {
                let Some(task) = state.heap.pop() else { break };
                let gate = Arc::clone(&gate);
                let fetch = Arc::clone(&spec.fetch_range);
                set.spawn(async move {
                    let result = gate.run(move || fetch(task.start, task.end)).await;
                    (task, result)
                });
            }

            while let Some(joined) = set.join_next().await {
                let (task, result) = joined.map_err(FetchError::provider)?;
                self.handle_result(spec, &mut state, task, result);
            }
        }

        let RunState { items, mut stats, .. } = state;
        let items = dedup_and_sort(items, &spec.key_fn, &spec.order_fn, &mut stats, &self.telemetry);
        stats.duration = started.elapsed();

        info!(
            spec = spec.name(),
            ranges_processed = stats.ranges_processed,
            ranges_split = stats.ranges_split,
            ranges_failed = stats.ranges_failed,
            items = stats.items_returned,
            "Adaptive range fetch complete"
        );
        self.telemetry.event(
            "splitter_completed",
            &[
                ("spec", spec.name().to_string()),
                ("ranges_processed", stats.ranges_processed.to_string()),
                ("ranges_failed", stats.ranges_failed.to_string()),
                ("items", stats.items_returned.to_string()),
            ],
        );

        Ok(FetchOutcome { items, stats })
    }

    /// Fetches both boundary sub-ranges before the center range is seeded.
    async fn kickoff_edges<T: Send + 'static>(
        &self,
        spec: &RangeSpec<T>,
        gate: &Arc<CallGate>,
        state: &mut RunState<T>,
        start_block: BlockNumber,
        end_block: BlockNumber,
    ) {
        let quarter = (end_block - start_block) / 4;
        let left_end = start_block + quarter.min(EDGE_KICKOFF_MAX_SPAN);
        let right_start = end_block.saturating_sub(quarter).max(left_end + 1);

        debug!(
            left_end = left_end,
            right_start = right_start,
            "Edge-first kickoff"
        );

        let left = state.task(start_block, left_end);
        let right = state.task(right_start, end_block);

        let fetch_left = Arc::clone(&spec.fetch_range);
        let fetch_right = Arc::clone(&spec.fetch_range);
        let (left_result, right_result) = tokio::join!(
            gate.run(move || fetch_left(left.start, left.end)),
            gate.run(move || fetch_right(right.start, right.end)),
        );

        self.handle_result(spec, state, left, left_result);
        self.handle_result(spec, state, right, right_result);

        // the unresolved center; failed edges were re-enqueued above
        state.push_range(left_end + 1, right_start - 1);
    }

    /// Routes one fetch result: accept, split, or retry/give up.
    fn handle_result<T>(
        &self,
        spec: &RangeSpec<T>,
        state: &mut RunState<T>,
        task: RangeTask,
        result: CallResult<T>,
    ) {
        state.stats.ranges_processed += 1;
        let width = task.width();

        match result {
            Ok(items) if items.len() >= self.max_offset && width > self.min_range_width => {
                let pivot = self.split_pivot(&task, items.len());
                debug!(
                    spec = spec.name(),
                    range_start = task.start,
                    range_end = task.end,
                    item_count = items.len(),
                    pivot = pivot,
                    "Saturated range, splitting"
                );
                state.stats.ranges_split += 1;
                // the truncated response is discarded; both halves re-fetch
                state.push_range(task.start, pivot);
                state.push_range(pivot + 1, task.end);
            }
            Ok(items) => {
                if items.len() >= self.max_offset {
                    warn!(
                        spec = spec.name(),
                        range_start = task.start,
                        range_end = task.end,
                        width = width,
                        item_count = items.len(),
                        "Range saturated at the minimum width, accepting possibly truncated data"
                    );
                    state.stats.ranges_saturated_at_floor += 1;
                    self.telemetry.event(
                        "range_saturated_at_floor",
                        &[
                            ("spec", spec.name().to_string()),
                            ("start", task.start.to_string()),
                            ("end", task.end.to_string()),
                            ("item_count", items.len().to_string()),
                        ],
                    );
                }
                state.stats.items_fetched += items.len() as u64;
                state.items.extend(items);
            }
            Err(err) => {
                let entry = state.attempts.entry((task.start, task.end)).or_insert(0);
                *entry += 1;
                let attempt = *entry;
                if attempt < self.max_attempts_per_range {
                    warn!(
                        spec = spec.name(),
                        range_start = task.start,
                        range_end = task.end,
                        attempt = attempt,
                        max_attempts = self.max_attempts_per_range,
                        error = %err,
                        "Range fetch failed, re-enqueueing"
                    );
                    state.stats.ranges_retried += 1;
                    state.push_range(task.start, task.end);
                } else {
                    error!(
                        spec = spec.name(),
                        range_start = task.start,
                        range_end = task.end,
                        attempts = attempt,
                        error = %err,
                        "Range attempt budget exhausted, dropping range from result"
                    );
                    state.stats.ranges_failed += 1;
                    self.telemetry.error(
                        "range_failed",
                        &err,
                        &[
                            ("spec", spec.name().to_string()),
                            ("start", task.start.to_string()),
                            ("end", task.end.to_string()),
                        ],
                    );
                }
            }
        }
    }

    /// Chooses the split point for a saturated range.
    ///
    /// The returned pivot is always in `[task.start, task.end - 1]`, so both
    /// halves are non-empty and the loop cannot re-enqueue the input range
    /// unchanged.
    fn split_pivot(&self, task: &RangeTask, item_count: usize) -> BlockNumber {
        let width = task.width();
        let density = item_count as f64 / width as f64;
        let raw = (self.max_offset as f64 / density) * SPLIT_SAFETY_MARGIN;

        // a response saturated exactly at the cap carries no density
        // information (the estimate collapses to the full width); bisect
        let mut target_len = raw as u64;
        if target_len >= width {
            target_len = width / 2;
        }
        let target_len = target_len.clamp(self.min_range_width.min(width - 1), width - 1);

        task.start + target_len - 1
    }
}
