//! kpl-agg-core
//!
//! Codec for the Kinesis Producer Library aggregated record format.
//! Packs many small user records into one physical stream record and
//! unpacks them transparently on read.
//!
//! ```text
//! [ F3 89 9A C2 ][ protobuf AggregatedRecord ][ md5(body) ]
//! ```
//!
//! No transport, no retries, no configuration loading.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod records;

// Leaf layers
pub mod checksum;
pub mod dedup;
pub mod framing;
pub mod telemetry;

// Pipelines
pub mod aggregation;
pub mod deaggregation;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::aggregation::{aggregate, AggregationProfile, PutCompletion, RecordAggregator};
    pub use crate::deaggregation::{
        deaggregate, deaggregate_all, deaggregate_batch, deaggregate_iter, deaggregate_sync,
    };
    pub use crate::records::{EncodedRecord, PendingRecord, RawRecord, UserRecord};
    pub use crate::telemetry::TelemetryCounters;
    pub use crate::types::KplError;
}
