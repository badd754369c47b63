//! Record shapes crossing the library boundary.
//!
//! - `RawRecord`: what a stream reader hands to deaggregation
//! - `PendingRecord`: what a producer hands to aggregation
//! - `UserRecord`: one logical record recovered by deaggregation
//! - `EncodedRecord`: one physical record ready for the put sink

use bytes::Bytes;

/// Physical record as read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub partition_key: String,
    /// Stream-assigned position; an arbitrarily large decimal string.
    pub sequence_number: String,
    pub data: Bytes,
}

impl RawRecord {
    pub fn new(
        partition_key: impl Into<String>,
        sequence_number: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            sequence_number: sequence_number.into(),
            data: data.into(),
        }
    }
}

/// Logical record submitted for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub partition_key: String,
    /// Optional hashing override for shard routing.
    pub explicit_hash_key: Option<String>,
    pub data: Bytes,
}

impl PendingRecord {
    pub fn new(partition_key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            partition_key: partition_key.into(),
            explicit_hash_key: None,
            data: data.into(),
        }
    }

    pub fn with_explicit_hash_key(mut self, key: impl Into<String>) -> Self {
        self.explicit_hash_key = Some(key.into());
        self
    }
}

// Re-packing deaggregated records keeps key, hash override and payload.
impl From<UserRecord> for PendingRecord {
    fn from(record: UserRecord) -> Self {
        PendingRecord {
            partition_key: record.partition_key,
            explicit_hash_key: record.explicit_partition_key,
            data: record.data,
        }
    }
}

/// Logical record recovered from a raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub partition_key: String,
    pub explicit_partition_key: Option<String>,
    /// Copied verbatim from the parent raw record.
    pub sequence_number: String,
    /// Position within the parent aggregate; `None` for pass-through records.
    pub sub_sequence_number: Option<u64>,
    pub data: Bytes,
}

impl UserRecord {
    /// Pass-through view of a raw record that is not aggregated.
    pub fn passthrough(raw: &RawRecord) -> Self {
        Self {
            partition_key: raw.partition_key.clone(),
            explicit_partition_key: None,
            sequence_number: raw.sequence_number.clone(),
            sub_sequence_number: None,
            data: raw.data.clone(),
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.sub_sequence_number.is_some()
    }
}

/// Physical record produced by aggregation, shaped for the put sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    /// Partition key of the first sub-record.
    pub partition_key: String,
    /// Explicit hash key of the first sub-record, when it carried one.
    pub explicit_hash_key: Option<String>,
    /// magic + protobuf body + checksum
    pub data: Bytes,
}

impl EncodedRecord {
    /// View this record as the stream would return it, for consumer-side tests and replays.
    pub fn into_raw(self, sequence_number: impl Into<String>) -> RawRecord {
        RawRecord {
            partition_key: self.partition_key,
            sequence_number: sequence_number.into(),
            data: self.data,
        }
    }
}
