use std::{sync::Arc, time::Instant};

use tokio::task::JoinSet;

use crate::{
    FetchError,
    dedup::dedup_and_sort,
    gate::CallGate,
    page_fetcher::{FetchSpec, PagingMode, ProviderPolicy},
    rate_limit::RateLimiter,
    retry::RetryPolicy,
    stats::{FetchOutcome, RunStats},
    telemetry::{Telemetry, TelemetrySink},
    types::{BlockNumber, CallResult, PageRequest},
};

/// Default number of page fetches processed concurrently.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 5;

/// End bound used when the caller supplies none and resolution fails or is
/// unavailable. Large enough to cover any real chain height.
pub const FALLBACK_END_BLOCK: BlockNumber = 99_999_999;

/// Builder for [`PageFetcher`].
#[derive(Clone)]
pub struct PageFetcherBuilder {
    policy: ProviderPolicy,
    max_concurrent: usize,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry: Option<RetryPolicy>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl PageFetcherBuilder {
    /// Creates a builder for the given provider policy.
    #[must_use]
    pub fn new(policy: ProviderPolicy) -> Self {
        Self {
            policy,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            rate_limiter: None,
            retry: None,
            telemetry: None,
        }
    }

    /// Sets the maximum number of page fetches in flight at once.
    ///
    /// Increasing this value can improve throughput at the cost of a higher
    /// burst rate against the provider's rate limit.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn max_concurrent_fetches(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Injects a caller-owned rate limiter; calls are throttled under the
    /// policy's `rps_key`.
    #[must_use]
    pub fn rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Injects a retry policy wrapping every page call.
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

    /// Validates the configuration and builds the fetcher.
    ///
    /// # Errors
    ///
    /// * [`FetchError::InvalidPrefetch`] if the policy's prefetch is zero.
    /// * [`FetchError::InvalidWindowCap`] if the policy's window cap is zero.
    /// * [`FetchError::InvalidMaxConcurrent`] if `max_concurrent_fetches` is
    ///   zero.
    pub fn build(self) -> Result<PageFetcher, FetchError> {
        if self.policy.prefetch == 0 {
            return Err(FetchError::InvalidPrefetch);
        }
        if self.policy.window_cap == Some(0) {
            return Err(FetchError::InvalidWindowCap);
        }
        if self.max_concurrent == 0 {
            return Err(FetchError::InvalidMaxConcurrent);
        }
        Ok(PageFetcher {
            policy: self.policy,
            max_concurrent: self.max_concurrent,
            rate_limiter: self.rate_limiter,
            retry: self.retry,
            telemetry: Telemetry::new(self.telemetry),
        })
    }
}

/// Generic pager for providers with well-known pagination semantics.
///
/// Drives a [`FetchSpec`]'s page callback according to a [`ProviderPolicy`]
/// (strict page numbers or a sliding start-block window) and terminates
/// into the shared dedup/order step.
///
/// # Failure semantics
///
/// Pagination is stateful: each page's meaning depends on having read the
/// previous ones, so a silently partial result would misreport completeness.
/// Any error left after the retry policy therefore fails the entire call.
/// Contrast with [`RangeSplitter`][splitter], which records failed sub-ranges
/// in its stats and keeps going.
///
/// [splitter]: crate::RangeSplitter
pub struct PageFetcher {
    policy: ProviderPolicy,
    max_concurrent: usize,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry: Option<RetryPolicy>,
    telemetry: Telemetry,
}

impl PageFetcher {
    /// Creates a builder for the given provider policy.
    #[must_use]
    pub fn builder(policy: ProviderPolicy) -> PageFetcherBuilder {
        PageFetcherBuilder::new(policy)
    }

    /// Fetches every item of `spec` within `[start_block, end_block]`.
    ///
    /// When `end_block` is `None` it is resolved once through
    /// `spec.resolve_end_block` (falling back to [`FALLBACK_END_BLOCK`]) and
    /// treated as a fixed snapshot for the whole call. An end bound at or
    /// below `start_block` yields an empty outcome with zero provider calls.
    ///
    /// # Errors
    ///
    /// * [`FetchError::InvalidMaxOffset`] if the spec's `max_offset` is zero.
    /// * [`FetchError::MissingOrderKey`] if sliding advancement cannot read
    ///   the last item's block number.
    /// * Any provider error that survives the retry policy.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub async fn fetch_all<T: Send + 'static>(
        &self,
        spec: &FetchSpec<T>,
        start_block: BlockNumber,
        end_block: Option<BlockNumber>,
    ) -> Result<FetchOutcome<T>, FetchError> {
        if spec.max_offset == 0 {
            return Err(FetchError::InvalidMaxOffset);
        }

        let started = Instant::now();
        let mut stats = RunStats::default();

        let end_block = match end_block {
            Some(end) => end,
            None => self.resolve_end_block(spec).await,
        };
        stats.resolved_end_block = Some(end_block);

        if end_block <= start_block {
            debug!(
                spec = spec.name(),
                start_block = start_block,
                end_block = end_block,
                "Empty block range, nothing to fetch"
            );
            stats.duration = started.elapsed();
            return Ok(FetchOutcome::empty(stats));
        }

        info!(
            spec = spec.name(),
            mode = %self.policy.mode,
            start_block = start_block,
            end_block = end_block,
            "Starting paginated fetch"
        );

        let gate = Arc::new(CallGate::new(
            self.max_concurrent,
            self.rate_limiter.clone(),
            self.policy.rps_key.clone(),
            self.retry.clone(),
        ));

        let fetched = match self.policy.mode {
            PagingMode::Sliding => {
                self.fetch_sliding(spec, &gate, start_block, end_block, &mut stats).await
            }
            PagingMode::Paged => {
                self.fetch_paged(spec, &gate, start_block, end_block, &mut stats).await
            }
        };

        match fetched {
            Ok(items) => {
                let items = dedup_and_sort(
                    items,
                    &spec.key_fn,
                    &spec.order_fn,
                    &mut stats,
                    &self.telemetry,
                );
                stats.duration = started.elapsed();
                self.telemetry.event(
                    "pager_completed",
                    &[
                        ("spec", spec.name().to_string()),
                        ("mode", self.policy.mode.to_string()),
                        ("pages", stats.pages_processed.to_string()),
                        ("items", stats.items_returned.to_string()),
                    ],
                );
                Ok(FetchOutcome { items, stats })
            }
            Err(err) => {
                error!(spec = spec.name(), mode = %self.policy.mode, error = %err, "Fetch failed");
                self.telemetry.error(
                    "pager_failed",
                    &err,
                    &[
                        ("spec", spec.name().to_string()),
                        ("mode", self.policy.mode.to_string()),
                    ],
                );
                Err(err)
            }
        }
    }

    /// Resolves the end bound once; failures fall back to the sentinel so a
    /// head lookup outage cannot fail a backfill before it starts.
    async fn resolve_end_block<T>(&self, spec: &FetchSpec<T>) -> BlockNumber {
        match &spec.resolve_end_block {
            Some(resolve) => match resolve().await {
                Ok(head) => head,
                Err(err) => {
                    warn!(
                        spec = spec.name(),
                        error = %err,
                        fallback = FALLBACK_END_BLOCK,
                        "End block resolution failed, using fallback"
                    );
                    FALLBACK_END_BLOCK
                }
            },
            None => FALLBACK_END_BLOCK,
        }
    }

    /// Sliding-window loop: one request at a time, advancing the start
    /// boundary past the last item seen.
    async fn fetch_sliding<T>(
        &self,
        spec: &FetchSpec<T>,
        gate: &CallGate,
        start_block: BlockNumber,
        end_block: BlockNumber,
        stats: &mut RunStats,
    ) -> CallResult<T> {
        let offset = spec.max_offset;
        let mut items: Vec<T> = Vec::new();
        let mut current_start = start_block;

        while current_start <= end_block {
            let window_end = match self.policy.window_cap {
                Some(cap) => end_block.min(current_start.saturating_add(cap - 1)),
                None => end_block,
            };
            let request =
                PageRequest { page: 1, start_block: current_start, end_block: window_end, offset };

            let fetch = Arc::clone(&spec.fetch_page);
            let page = gate.run(move || fetch(request)).await?;
            stats.pages_processed += 1;
            stats.items_fetched += page.len() as u64;
            debug!(
                spec = spec.name(),
                window_start = current_start,
                window_end = window_end,
                item_count = page.len(),
                "Fetched sliding page"
            );

            let full_page = page.len() >= offset;
            let last_order_key = page.last().map(|item| (spec.order_fn)(item));
            items.extend(page);

            if full_page {
                match last_order_key {
                    Some(Some((last_block, _))) => {
                        // never move the cursor backwards
                        current_start = (last_block + 1).max(current_start + 1);
                    }
                    _ => return Err(FetchError::MissingOrderKey),
                }
            } else if window_end >= end_block {
                // short page with nothing beyond the window: stream exhausted
                break;
            } else {
                current_start = window_end + 1;
            }
        }

        Ok(items)
    }

    /// Page-number loop: batches of `prefetch` concurrent page requests.
    ///
    /// Providers are assumed to return pages in non-decreasing page order
    /// with no gaps, so the first empty or short page anywhere in a batch
    /// ends the whole stream once that batch completes; items from every
    /// page of the terminal batch are kept.
    async fn fetch_paged<T: Send + 'static>(
        &self,
        spec: &FetchSpec<T>,
        gate: &Arc<CallGate>,
        start_block: BlockNumber,
        end_block: BlockNumber,
        stats: &mut RunStats,
    ) -> CallResult<T> {
        let offset = spec.max_offset;
        let prefetch = self.policy.prefetch as u64;
        let mut items: Vec<T> = Vec::new();
        let mut page_cursor: u64 = 1;

        loop {
            let mut set: JoinSet<(u64, CallResult<T>)> = JoinSet::new();
            for page in page_cursor..page_cursor + prefetch {
                let gate = Arc::clone(gate);
                let fetch = Arc::clone(&spec.fetch_page);
                let request = PageRequest { page, start_block, end_block, offset };
                set.spawn(async move { (page, gate.run(move || fetch(request)).await) });
            }

            let mut batch: Vec<(u64, Vec<T>)> = Vec::with_capacity(self.policy.prefetch);
            while let Some(joined) = set.join_next().await {
                // an early return drops the set and aborts the rest of the
                // batch, matching the whole-call failure contract
                let (page, result) = joined.map_err(FetchError::provider)?;
                batch.push((page, result?));
            }
            batch.sort_by_key(|(page, _)| *page);

            let mut end_of_stream = false;
            for (page, page_items) in batch {
                stats.pages_processed += 1;
                stats.items_fetched += page_items.len() as u64;
                if page_items.is_empty() || page_items.len() < offset {
                    debug!(
                        spec = spec.name(),
                        page = page,
                        item_count = page_items.len(),
                        "Short page, ending stream after this batch"
                    );
                    end_of_stream = true;
                }
                items.extend(page_items);
            }
            if end_of_stream {
                break;
            }
            page_cursor += prefetch;
        }

        Ok(items)
    }
}
