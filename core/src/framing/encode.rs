use bytes::Bytes;
use prost::encoding::{encoded_len_varint, key_len};
use prost::Message;

use crate::checksum;
use crate::constants::{field_tags, KPL_AGGREGATED_MAGIC, RECORD_OVERHEAD};
use crate::framing::types::{AggregatedRecord, FrameError};

/// Serialize the body only: tables, then sub-records.
pub fn encode_body(record: &AggregatedRecord) -> Vec<u8> {
    record.encode_to_vec()
}

/// Encode an aggregated record into canonical wire format.
///
/// Layout:
///
/// ```text
/// [ magic F3 89 9A C2 (4) ]
/// [ protobuf body     (N) ]
/// [ md5(body)        (16) ]
/// ```
pub fn encode_record(record: &AggregatedRecord) -> Result<Bytes, FrameError> {
    let body_len = record.encoded_len();
    let expected = RECORD_OVERHEAD + body_len;
    let mut out = Vec::with_capacity(expected);

    // --- Magic ---
    out.extend_from_slice(&KPL_AGGREGATED_MAGIC);

    // --- Body ---
    record.encode(&mut out)?;

    // --- Checksum ---
    let digest = checksum::compute(&out[KPL_AGGREGATED_MAGIC.len()..]);
    out.extend_from_slice(&digest);

    debug_assert_eq!(out.len(), expected);
    Ok(Bytes::from(out))
}

/// Encoded length of one key table entry (`repeated string`, field `tag`).
#[inline]
pub fn table_entry_len(tag: u32, value: &str) -> usize {
    key_len(tag) + encoded_len_varint(value.len() as u64) + value.len()
}

/// Encoded length of one sub-record as a field of the body, framing included.
#[inline]
pub fn sub_record_len(
    partition_key_index: u64,
    explicit_hash_key_index: Option<u64>,
    data_len: usize,
) -> usize {
    let mut inner = key_len(field_tags::PARTITION_KEY_INDEX)
        + encoded_len_varint(partition_key_index);

    if let Some(idx) = explicit_hash_key_index {
        inner += key_len(field_tags::EXPLICIT_HASH_KEY_INDEX) + encoded_len_varint(idx);
    }

    inner += key_len(field_tags::DATA) + encoded_len_varint(data_len as u64) + data_len;

    key_len(field_tags::RECORDS) + encoded_len_varint(inner as u64) + inner
}
