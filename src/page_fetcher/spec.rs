use std::{fmt, sync::Arc};

use crate::types::{
    BlockNumber, CallResult, FetchPageFn, KeyFn, OrderFn, PageRequest, ResolveEndBlockFn,
};

/// Default per-page item cap requested from the provider.
pub const DEFAULT_MAX_OFFSET: usize = 1_000;

/// Immutable description of one paginated dataset: how to fetch a page, how
/// to identify an item, and how to order the result.
///
/// All behavior lives in explicit function-typed fields rather than ambient
/// closures over mutable state, which keeps the engine pure with respect to
/// its inputs and makes stubbing trivial in tests. The callbacks may be
/// invoked concurrently.
pub struct FetchSpec<T> {
    name: String,
    pub(crate) fetch_page: FetchPageFn<T>,
    pub(crate) key_fn: KeyFn<T>,
    pub(crate) order_fn: OrderFn<T>,
    pub(crate) max_offset: usize,
    pub(crate) resolve_end_block: Option<ResolveEndBlockFn>,
}

impl<T> FetchSpec<T> {
    /// Creates a spec from its three mandatory callbacks.
    ///
    /// `name` labels the dataset in logs and telemetry (e.g. `"txlist"`).
    /// The per-page cap defaults to [`DEFAULT_MAX_OFFSET`]; override it with
    /// [`max_offset`](Self::max_offset) to match the provider's limit.
    pub fn new<F, Fut, K, O>(name: impl Into<String>, fetch_page: F, key_fn: K, order_fn: O) -> Self
    where
        F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult<T>> + Send + 'static,
        K: Fn(&T) -> Option<String> + Send + Sync + 'static,
        O: Fn(&T) -> Option<(BlockNumber, u64)> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            fetch_page: Arc::new(move |request| Box::pin(fetch_page(request))),
            key_fn: Arc::new(key_fn),
            order_fn: Arc::new(order_fn),
            max_offset: DEFAULT_MAX_OFFSET,
            resolve_end_block: None,
        }
    }

    /// Sets the provider's per-page item cap.
    ///
    /// Must be greater than 0. A page returning exactly this many items is
    /// treated as full; fewer ends the stream.
    #[must_use]
    pub fn max_offset(mut self, max_offset: usize) -> Self {
        self.max_offset = max_offset;
        self
    }

    /// Supplies a resolver for the chain head, used when `fetch_all` is
    /// called without an explicit end block.
    #[must_use]
    pub fn resolve_end_block<F, Fut>(mut self, resolve: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<BlockNumber, crate::FetchError>> + Send + 'static,
    {
        self.resolve_end_block = Some(Arc::new(move || Box::pin(resolve())));
        self
    }

    /// Dataset label used in logs and telemetry.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// manual impl: cloning the spec shares the callbacks and must not require
// T: Clone
impl<T> Clone for FetchSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fetch_page: Arc::clone(&self.fetch_page),
            key_fn: Arc::clone(&self.key_fn),
            order_fn: Arc::clone(&self.order_fn),
            max_offset: self.max_offset,
            resolve_end_block: self.resolve_end_block.clone(),
        }
    }
}

impl<T> fmt::Debug for FetchSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSpec")
            .field("name", &self.name)
            .field("max_offset", &self.max_offset)
            .field("resolves_end_block", &self.resolve_end_block.is_some())
            .finish_non_exhaustive()
    }
}
