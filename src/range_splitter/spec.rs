use std::{fmt, sync::Arc};

use crate::types::{BlockNumber, CallResult, FetchRangeFn, KeyFn, OrderFn};

/// Immutable description of one range-fetched dataset: how to fetch a block
/// interval, how to identify an item, and how to order the result.
///
/// The splitter issues `fetch_range(start, end)` calls for closed intervals
/// it chooses; the callback owns transport, URL construction and decoding.
/// Callbacks may be invoked concurrently.
pub struct RangeSpec<T> {
    name: String,
    pub(crate) fetch_range: FetchRangeFn<T>,
    pub(crate) key_fn: KeyFn<T>,
    pub(crate) order_fn: OrderFn<T>,
}

impl<T> RangeSpec<T> {
    /// Creates a spec from its three mandatory callbacks.
    ///
    /// `name` labels the dataset in logs and telemetry.
    pub fn new<F, Fut, K, O>(name: impl Into<String>, fetch_range: F, key_fn: K, order_fn: O) -> Self
    where
        F: Fn(BlockNumber, BlockNumber) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult<T>> + Send + 'static,
        K: Fn(&T) -> Option<String> + Send + Sync + 'static,
        O: Fn(&T) -> Option<(BlockNumber, u64)> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            fetch_range: Arc::new(move |start, end| Box::pin(fetch_range(start, end))),
            key_fn: Arc::new(key_fn),
            order_fn: Arc::new(order_fn),
        }
    }

    /// Dataset label used in logs and telemetry.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// manual impl: cloning the spec shares the callbacks and must not require
// T: Clone
impl<T> Clone for RangeSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fetch_range: Arc::clone(&self.fetch_range),
            key_fn: Arc::clone(&self.key_fn),
            order_fn: Arc::clone(&self.order_fn),
        }
    }
}

impl<T> fmt::Debug for RangeSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSpec").field("name", &self.name).finish_non_exhaustive()
    }
}
