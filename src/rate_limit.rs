//! Rate-limiting port.
//!
//! Every outbound page/range call first awaits admission from a caller-owned
//! [`RateLimiter`], keyed by the provider's rate-limit bucket (the
//! `rps_key` on [`ProviderPolicy`][policy] / [`RangeSplitterBuilder`][splitter]).
//! Admission for one key must not starve callers waiting on a different key.
//!
//! [policy]: crate::ProviderPolicy
//! [splitter]: crate::RangeSplitterBuilder

use std::time::Duration;

use futures::future::BoxFuture;
use governor::{DefaultKeyedRateLimiter, Quota};

/// Admits one call per logical key no faster than a configured interval.
///
/// Caller-owned, injected, and shared across concurrent fetch calls; all
/// methods take `&self` and implementations must be safe for concurrent use.
pub trait RateLimiter: Send + Sync {
    /// Waits until a call under `key` may proceed.
    fn acquire<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()>;
}

/// Keyed interval limiter backed by [`governor`].
///
/// Each key gets its own bucket replenishing one permit per `min_interval`;
/// the first call on a fresh key is admitted immediately.
pub struct KeyedRateLimiter {
    inner: DefaultKeyedRateLimiter<String>,
}

impl KeyedRateLimiter {
    /// Creates a limiter admitting one call per key per `min_interval`.
    ///
    /// # Panics
    ///
    /// Panics if `min_interval` is zero.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        let quota = Quota::with_period(min_interval)
            .expect("min_interval must be greater than zero");
        Self { inner: DefaultKeyedRateLimiter::keyed(quota) }
    }
}

impl RateLimiter for KeyedRateLimiter {
    fn acquire<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let key = key.to_string();
            self.inner.until_key_ready(&key).await;
        })
    }
}
