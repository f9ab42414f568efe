use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::FetchError;

/// Block height on the chain the provider indexes.
pub type BlockNumber = u64;

/// Result of a single outbound provider call.
pub type CallResult<T> = Result<Vec<T>, FetchError>;

/// Parameters of one page request, handed to [`FetchPageFn`].
///
/// Providers with page-number pagination read `page`; providers with
/// sliding-window pagination always receive `page == 1` and read the block
/// bounds instead. `offset` is the requested page size in items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub offset: usize,
}

/// Caller-supplied page fetch callback.
///
/// Owns the HTTP client, URL construction and response decoding; the engine
/// only sees the resulting items. Must be cheap to clone (hence `Arc`) and
/// must not capture mutable state: the engine may invoke it concurrently.
pub type FetchPageFn<T> =
    Arc<dyn Fn(PageRequest) -> BoxFuture<'static, CallResult<T>> + Send + Sync>;

/// Caller-supplied range fetch callback, used only by the splitter.
///
/// Same contract as [`FetchPageFn`], keyed by a closed block interval.
pub type FetchRangeFn<T> =
    Arc<dyn Fn(BlockNumber, BlockNumber) -> BoxFuture<'static, CallResult<T>> + Send + Sync>;

/// Resolves the chain head when the caller does not know the end bound.
pub type ResolveEndBlockFn =
    Arc<dyn Fn() -> BoxFuture<'static, Result<BlockNumber, FetchError>> + Send + Sync>;

/// Extracts the deduplication key of an item. Items with no resolvable key
/// cannot be deduplicated safely and are dropped.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// Extracts the sort key of an item. The first component MUST be the item's
/// block number: it orders the final result and drives sliding-window
/// advancement. The second component breaks ties within a block (e.g. a
/// transaction or log index).
pub type OrderFn<T> = Arc<dyn Fn(&T) -> Option<(BlockNumber, u64)> + Send + Sync>;
