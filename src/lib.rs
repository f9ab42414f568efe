//! range-fetcher is a library for pulling complete, deduplicated,
//! stably-ordered datasets out of paginated, rate-limited block data
//! providers.
//!
//! The entry points are [`PageFetcher`] (built via [`PageFetcherBuilder`])
//! for providers with well-known pagination semantics, and [`RangeSplitter`]
//! (built via [`RangeSplitterBuilder`]) for providers whose per-call item
//! cap is the only truncation signal.
//!
//! Describe the dataset once (how to fetch a page or range, how to identify
//! an item, how to order the result) as a [`FetchSpec`] or [`RangeSpec`],
//! then call `fetch_all` for a closed block interval.
//!
//! # Choosing an engine
//!
//! Use the [`PageFetcher`] when the provider documents its pagination:
//! either strict page numbers ([`PagingMode::Paged`]) or a sliding
//! start-block window ([`PagingMode::Sliding`]). Use the [`RangeSplitter`]
//! when the provider silently truncates large responses and ordinary
//! pagination would need too many round trips: it recursively splits any
//! sub-range that saturates the cap, widest range first.
//!
//! # Ordering and duplicates
//!
//! Both engines finish through the same step: items are deduplicated by the
//! spec's key function (first seen wins; items without a key are dropped)
//! and stable-sorted ascending by its order function. No ordering is
//! guaranteed for the outbound calls themselves.
//!
//! # Failure semantics
//!
//! The two engines deliberately differ. The pager fails the whole call on
//! any unrecovered error, because a partial paginated result would be
//! indistinguishable from a complete one. The splitter records permanently
//! failed sub-ranges in [`RunStats`] and returns what it has; check
//! [`FetchOutcome::is_partial`] after a backfill.
//!
//! # Injected services
//!
//! Rate limiting ([`RateLimiter`]), retries ([`RetryPolicy`]) and telemetry
//! ([`TelemetrySink`]) are caller-owned and injected; all of them are
//! optional and may be shared across concurrent fetch calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use range_fetcher::{FetchSpec, PageFetcher, ProviderPolicy, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let spec = FetchSpec::new(
//!         "txlist",
//!         |request| async move {
//!             // perform the provider HTTP call for `request` here
//!             let _ = request;
//!             Ok(Vec::<serde_json::Value>::new())
//!         },
//!         |tx| tx.get("hash").and_then(|h| h.as_str()).map(String::from),
//!         |tx| {
//!             let block = tx.get("blockNumber")?.as_str()?.parse().ok()?;
//!             let index = tx.get("transactionIndex")?.as_str()?.parse().ok()?;
//!             Some((block, index))
//!         },
//!     )
//!     .max_offset(10_000);
//!
//!     let fetcher = PageFetcher::builder(ProviderPolicy::sliding().rps_key("etherscan"))
//!         .retry_policy(RetryPolicy::new())
//!         .build()?;
//!
//!     let outcome = fetcher.fetch_all(&spec, 18_000_000, Some(18_100_000)).await?;
//!     println!("fetched {} transactions", outcome.len());
//!     Ok(())
//! }
//! ```

#[macro_use]
mod logging;

pub mod page_fetcher;
pub mod range_splitter;
pub mod rate_limit;
pub mod retry;
pub mod telemetry;

mod dedup;
mod error;
mod gate;
mod stats;
mod types;

pub use error::FetchError;
pub use stats::{FetchOutcome, RunStats};
pub use types::{
    BlockNumber, CallResult, FetchPageFn, FetchRangeFn, KeyFn, OrderFn, PageRequest,
    ResolveEndBlockFn,
};

pub use page_fetcher::{
    DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_MAX_OFFSET, DEFAULT_PREFETCH, FALLBACK_END_BLOCK,
    FetchSpec, PageFetcher, PageFetcherBuilder, PagingMode, ProviderPolicy,
};
pub use range_splitter::{
    DEFAULT_MAX_ATTEMPTS_PER_RANGE, DEFAULT_MIN_RANGE_WIDTH, EDGE_KICKOFF_MAX_SPAN, RangeSpec,
    RangeSplitter, RangeSplitterBuilder,
};

pub use rate_limit::{KeyedRateLimiter, RateLimiter};
pub use retry::{DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_MIN_DELAY, RetryPolicy};
pub use telemetry::{TelemetryFields, TelemetrySink, TracingTelemetry};
