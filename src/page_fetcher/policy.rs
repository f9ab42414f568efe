use std::fmt;

/// Default number of pages requested concurrently per batch in paged mode.
pub const DEFAULT_PREFETCH: usize = 3;

/// Pagination strategy a provider implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// Explicit, provider-tracked page numbers starting at 1, no gaps.
    Paged,
    /// The query's start boundary advances past the last item seen; the page
    /// number is always 1.
    Sliding,
}

impl fmt::Display for PagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMode::Paged => f.write_str("paged"),
            PagingMode::Sliding => f.write_str("sliding"),
        }
    }
}

/// Per-provider pagination policy.
///
/// Describes how a provider paginates, independent of what is being fetched
/// (that lives on [`FetchSpec`][spec]). One policy value is typically shared
/// by all specs targeting the same provider.
///
/// [spec]: crate::FetchSpec
#[derive(Debug, Clone)]
pub struct ProviderPolicy {
    /// Pagination strategy.
    pub mode: PagingMode,
    /// Pages requested concurrently per batch. Only meaningful in
    /// [`PagingMode::Paged`]; sliding mode is inherently sequential.
    pub prefetch: usize,
    /// Maximum span in blocks of a single sliding request. `None` means each
    /// request covers the whole remaining range.
    pub window_cap: Option<u64>,
    /// Rate-limit bucket for this provider; calls are only throttled when
    /// both this key and a rate limiter are configured.
    pub rps_key: Option<String>,
}

impl ProviderPolicy {
    /// Policy for a provider with page-number pagination.
    #[must_use]
    pub fn paged() -> Self {
        Self { mode: PagingMode::Paged, prefetch: DEFAULT_PREFETCH, window_cap: None, rps_key: None }
    }

    /// Policy for a provider with sliding-window pagination.
    #[must_use]
    pub fn sliding() -> Self {
        Self { mode: PagingMode::Sliding, prefetch: 1, window_cap: None, rps_key: None }
    }

    /// Sets the number of pages requested concurrently per batch.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Caps the span of a single sliding request at `window_cap` blocks.
    ///
    /// Must be greater than 0.
    #[must_use]
    pub fn window_cap(mut self, window_cap: u64) -> Self {
        self.window_cap = Some(window_cap);
        self
    }

    /// Sets the rate-limit bucket for this provider.
    #[must_use]
    pub fn rps_key(mut self, rps_key: impl Into<String>) -> Self {
        self.rps_key = Some(rps_key.into());
        self
    }
}
