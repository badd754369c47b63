use bytes::Bytes;
use prost::Message;

use crate::constants::{DIGEST_LEN, KPL_AGGREGATED_MAGIC, RECORD_OVERHEAD};
use crate::framing::types::{AggregatedRecord, FrameError, FrameView, KeyTable};

/// The magic prefix is the sole discriminator for aggregated payloads.
#[inline]
pub fn is_aggregated(data: &[u8]) -> bool {
    data.starts_with(&KPL_AGGREGATED_MAGIC)
}

/// Split an aggregated payload into body and trailing digest.
///
/// No allocation: the body is a slice of `wire`.
pub fn split_record(wire: &Bytes) -> Result<FrameView, FrameError> {
    if !is_aggregated(wire) {
        let mut m = [0u8; 4];
        let n = wire.len().min(4);
        m[..n].copy_from_slice(&wire[..n]);
        return Err(FrameError::InvalidMagic(m));
    }
    if wire.len() < RECORD_OVERHEAD {
        return Err(FrameError::Truncated { len: wire.len() });
    }

    let body_end = wire.len() - DIGEST_LEN;
    let mut checksum = [0u8; DIGEST_LEN];
    checksum.copy_from_slice(&wire[body_end..]);

    Ok(FrameView {
        body: wire.slice(KPL_AGGREGATED_MAGIC.len()..body_end),
        checksum,
    })
}

/// Decode a body and validate every table reference.
///
/// Sub-record data stays a slice of `body`.
pub fn decode_body(body: Bytes) -> Result<AggregatedRecord, FrameError> {
    let record = AggregatedRecord::decode(body)?;
    validate_indices(&record)?;
    Ok(record)
}

fn validate_indices(record: &AggregatedRecord) -> Result<(), FrameError> {
    let pk_len = record.partition_key_table.len();
    let ehk_len = record.explicit_hash_key_table.len();

    for sub in &record.records {
        if sub.partition_key_index >= pk_len as u64 {
            return Err(FrameError::TableIndexOutOfRange {
                table: KeyTable::PartitionKey,
                index: sub.partition_key_index,
                len: pk_len,
            });
        }
        if let Some(idx) = sub.explicit_hash_key_index {
            if idx >= ehk_len as u64 {
                return Err(FrameError::TableIndexOutOfRange {
                    table: KeyTable::ExplicitHashKey,
                    index: idx,
                    len: ehk_len,
                });
            }
        }
    }
    Ok(())
}
