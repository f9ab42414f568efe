//! Transient-failure retry layer.
//!
//! [`RetryPolicy`] wraps a single provider call in exponential backoff plus
//! an overall deadline. It answers "retry this call?" only; the splitter's
//! per-range attempt budget ([`RangeSplitterBuilder::max_attempts_per_range`])
//! is an independent layer on top answering "give up on this range?", and the
//! two deliberately do not share state.
//!
//! [`RangeSplitterBuilder::max_attempts_per_range`]: crate::RangeSplitterBuilder::max_attempts_per_range

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::time::timeout;

use crate::error::FetchError;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default minimum backoff delay between attempts.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(200);
/// Default overall deadline for one call, retries and backoff included.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Exponential-backoff retry policy with a per-call deadline.
///
/// Caller-owned and injected into the engines; one instance may be shared by
/// many concurrent fetch calls. On exhaustion the last error is returned
/// unchanged, so callers still see the provider's own failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    min_delay: Duration,
    call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Creates a policy with the default attempt count, backoff and deadline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: DEFAULT_MIN_DELAY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Sets how many times a failed call is retried after the first attempt.
    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the minimum backoff delay between attempts.
    #[must_use]
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Sets the overall deadline for one call, including time spent in
    /// backoff and in the call itself.
    #[must_use]
    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Runs `operation` with exponential backoff under the call deadline.
    ///
    /// # Errors
    ///
    /// * [`FetchError::Timeout`] if the deadline elapses, whatever attempt
    ///   was in flight.
    /// * The operation's own last error once retries are exhausted.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let strategy = ExponentialBuilder::default()
            .with_max_times(self.max_retries)
            .with_min_delay(self.min_delay);

        timeout(
            self.call_timeout,
            operation
                .retry(strategy)
                .notify(|err: &FetchError, dur: Duration| {
                    warn!(error = %err, "Provider call failed, retrying after {:?}", dur);
                })
                .sleep(tokio::time::sleep),
        )
        .await
        .map_err(FetchError::from)?
    }
}
