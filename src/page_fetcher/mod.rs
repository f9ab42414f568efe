mod fetcher;
mod policy;
mod spec;

pub use fetcher::{
    DEFAULT_MAX_CONCURRENT_FETCHES, FALLBACK_END_BLOCK, PageFetcher, PageFetcherBuilder,
};
pub use policy::{DEFAULT_PREFETCH, PagingMode, ProviderPolicy};
pub use spec::{DEFAULT_MAX_OFFSET, FetchSpec};
