mod spec;
mod splitter;
mod task;

pub use spec::RangeSpec;
pub use splitter::{
    DEFAULT_MAX_ATTEMPTS_PER_RANGE, DEFAULT_MIN_RANGE_WIDTH, EDGE_KICKOFF_MAX_SPAN, RangeSplitter,
    RangeSplitterBuilder,
};
