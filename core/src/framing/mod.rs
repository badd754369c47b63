//! Wire codec for KPL aggregated records.
//!
//! Responsibilities:
//! - Declare the protobuf messages of the aggregated record
//! - Encode a record into `[magic][body][md5(body)]`
//! - Decode a body with strict table index validation
//! - Exact size arithmetic for the packer
//!
//! Non-responsibilities:
//! - Checksum policy (deaggregation decides whether to verify)
//! - Size limits
//! - Dispatch

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    AggregatedRecord,
    SubRecord,
    Tag,
    KeyTable,
    FrameView,
    FrameError,
};

pub use encode::{encode_body, encode_record, sub_record_len, table_entry_len};
pub use decode::{decode_body, is_aggregated, split_record};
