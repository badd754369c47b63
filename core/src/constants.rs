/// Magic prefix that marks a payload as a KPL aggregated record.
pub const KPL_AGGREGATED_MAGIC: [u8; 4] = [0xF3, 0x89, 0x9A, 0xC2];

/// Length of the MD5 digest trailing every aggregated payload.
pub const DIGEST_LEN: usize = 16;

/// Service ceiling for one physical record (magic + body + checksum).
pub const MAX_RECORD_SIZE: usize = 1024 * 1024; // 1 MiB

/// Fixed framing bytes around the protobuf body.
pub const RECORD_OVERHEAD: usize = KPL_AGGREGATED_MAGIC.len() + DIGEST_LEN;

/// Defaults when a profile field is not set
pub const DEFAULT_QUEUE_SIZE: usize = 1;
/// KPL's default `AggregationMaxCount`.
pub const DEFAULT_MAX_SUB_RECORDS: usize = 4_294_967_295;

/// Protobuf field numbers of the aggregated record schema.
pub mod field_tags {
    pub const PARTITION_KEY_TABLE: u32     = 1;
    pub const EXPLICIT_HASH_KEY_TABLE: u32 = 2;
    pub const RECORDS: u32                 = 3;

    pub const PARTITION_KEY_INDEX: u32     = 1;
    pub const EXPLICIT_HASH_KEY_INDEX: u32 = 2;
    pub const DATA: u32                    = 3;
}
