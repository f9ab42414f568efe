use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

/// Errors emitted by the fetch engines.
///
/// `FetchError` values can be returned by builder `build()` methods, by
/// [`PageFetcher::fetch_all`][pager] (which fails the whole call on any
/// unrecovered provider error), and by caller-supplied fetch callbacks.
/// [`RangeSplitter::fetch_all`][splitter] absorbs provider errors per range
/// and reports them through [`RunStats`][stats] instead.
///
/// [pager]: crate::PageFetcher::fetch_all
/// [splitter]: crate::RangeSplitter::fetch_all
/// [stats]: crate::RunStats
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The data provider (or the caller-supplied callback wrapping it)
    /// returned an error.
    #[error("provider error: {0}")]
    Provider(Arc<dyn StdError + Send + Sync>),

    /// A per-call deadline elapsed inside the retry layer.
    #[error("operation timed out")]
    Timeout,

    /// Sliding-window advancement needs the last item's block number, but the
    /// order function could not resolve one.
    #[error("order key missing on final item of a full page")]
    MissingOrderKey,

    /// The configured per-page item cap is invalid (must be greater than
    /// zero).
    #[error("max offset must be greater than 0")]
    InvalidMaxOffset,

    /// The configured prefetch depth is invalid (must be greater than zero).
    #[error("prefetch must be greater than 0")]
    InvalidPrefetch,

    /// The configured sliding window cap is invalid (must be greater than
    /// zero when set).
    #[error("window cap must be greater than 0")]
    InvalidWindowCap,

    /// The configured maximum number of concurrent fetches is invalid (must
    /// be greater than zero).
    #[error("max concurrent fetches must be greater than 0")]
    InvalidMaxConcurrent,

    /// The configured minimum range width is invalid (must be greater than
    /// zero).
    #[error("min range width must be greater than 0")]
    InvalidMinRangeWidth,

    /// The configured per-range attempt budget is invalid (must be greater
    /// than zero).
    #[error("max attempts per range must be greater than 0")]
    InvalidMaxAttempts,
}

impl FetchError {
    /// Wraps an arbitrary provider/transport error so callbacks can surface
    /// their own error types without the engine knowing them.
    pub fn provider<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        FetchError::Provider(Arc::new(error))
    }

    /// Wraps a plain message as a provider error. Convenient for callbacks
    /// whose upstream reports errors as strings.
    pub fn provider_msg(message: impl Into<String>) -> Self {
        FetchError::Provider(Arc::new(ProviderMessage(message.into())))
    }
}

/// String-only provider error payload, see [`FetchError::provider_msg`].
#[derive(Error, Debug)]
#[error("{0}")]
struct ProviderMessage(String);

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FetchError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_msg_displays_inner_message() {
        let err = FetchError::provider_msg("status 502");
        assert_eq!(err.to_string(), "provider error: status 502");
    }

    #[test]
    fn provider_wraps_arbitrary_error_types() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = FetchError::provider(io);
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn errors_stay_cloneable() {
        let err = FetchError::provider_msg("boom");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
