use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::constants::DIGEST_LEN;

/// Aggregated record body.
///
/// ```text
/// message AggregatedRecord {
///   repeated string partition_key_table     = 1;
///   repeated string explicit_hash_key_table = 2;
///   repeated Record records                 = 3;
/// }
/// ```
#[derive(Clone, PartialEq, prost::Message)]
pub struct AggregatedRecord {
    #[prost(string, repeated, tag = "1")]
    pub partition_key_table: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    pub explicit_hash_key_table: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub records: Vec<SubRecord>,
}

/// One packed user record; keys are indices into the tables above.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SubRecord {
    #[prost(uint64, required, tag = "1")]
    pub partition_key_index: u64,
    #[prost(uint64, optional, tag = "2")]
    pub explicit_hash_key_index: Option<u64>,
    #[prost(bytes = "bytes", required, tag = "3")]
    pub data: Bytes,
    /// Decoded for compatibility; never produced by this crate.
    #[prost(message, repeated, tag = "4")]
    pub tags: Vec<Tag>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Tag {
    #[prost(string, required, tag = "1")]
    pub key: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

/// Which key table a sub-record index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTable {
    PartitionKey,
    ExplicitHashKey,
}

impl fmt::Display for KeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTable::PartitionKey => f.write_str("partition key"),
            KeyTable::ExplicitHashKey => f.write_str("explicit hash key"),
        }
    }
}

/// Aggregated payload split into body and trailing digest.
///
/// `body` is a zero-copy slice of the raw payload.
#[derive(Debug, Clone)]
pub struct FrameView {
    pub body: Bytes,
    pub checksum: [u8; DIGEST_LEN],
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid magic: {}", hex::encode(.0))]
    InvalidMagic([u8; 4]),

    /// Payload starts with the magic but cannot hold a digest.
    #[error("truncated aggregated record: {len} bytes")]
    Truncated { len: usize },

    #[error("protobuf decode failed: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error("protobuf encode failed: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),

    #[error("{table} table index {index} out of range (table length {len})")]
    TableIndexOutOfRange {
        table: KeyTable,
        index: u64,
        len: usize,
    },
}
