//! Per-call gating shared by both engines.
//!
//! Every outbound page/range fetch goes through the same sequence: acquire a
//! concurrency permit, await rate-limit admission for the provider's key,
//! then run the call under the retry policy. [`CallGate`] bundles that
//! sequence so the pager and the splitter cannot drift apart.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{rate_limit::RateLimiter, retry::RetryPolicy, types::CallResult};

/// One fetch invocation's gate: concurrency permit, rate-limit admission,
/// retry. Created per `fetch_all` call and discarded with it.
pub(crate) struct CallGate {
    semaphore: Arc<Semaphore>,
    limiter: Option<Arc<dyn RateLimiter>>,
    rps_key: Option<String>,
    retry: Option<RetryPolicy>,
}

impl CallGate {
    pub(crate) fn new(
        max_concurrent: usize,
        limiter: Option<Arc<dyn RateLimiter>>,
        rps_key: Option<String>,
        retry: Option<RetryPolicy>,
    ) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_concurrent)), limiter, rps_key, retry }
    }

    /// Runs one gated provider call.
    ///
    /// The permit is held for the full duration of the call, including all
    /// retry attempts, so `max_concurrent` bounds in-flight provider work
    /// rather than first attempts only.
    pub(crate) async fn run<T, F, Fut>(&self, operation: F) -> CallResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CallResult<T>>,
    {
        // the semaphore lives as long as the gate and is never closed
        let _permit = self.semaphore.acquire().await.ok();

        if let (Some(limiter), Some(key)) = (&self.limiter, &self.rps_key) {
            limiter.acquire(key).await;
        }

        match &self.retry {
            Some(retry) => retry.run(operation).await,
            None => operation().await,
        }
    }
}
