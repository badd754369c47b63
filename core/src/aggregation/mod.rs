//! Producer side: user records → minimal sequence of size-bounded aggregates.
//!
//! - `accumulator`: the in-progress aggregate, usable on its own
//! - `pipeline`: `aggregate()`, bounded emission plus completion barrier
//! - `profile`: queue depth and sub-record cap

pub mod accumulator;
pub mod pipeline;
pub mod profile;

pub use accumulator::{lone_record_size, RecordAggregator};
pub use pipeline::{aggregate, PutCompletion};
pub use profile::AggregationProfile;
