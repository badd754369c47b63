use tracing::{trace, warn};

use crate::checksum;
use crate::framing::{decode_body, is_aggregated, split_record, AggregatedRecord, SubRecord};
use crate::records::{RawRecord, UserRecord};
use crate::types::KplError;

/// Lazy, finite sequence of the user records packed in one raw record.
///
/// Validation (checksum, decode, table indices) has already happened by the
/// time this exists, so iteration cannot fail.
#[derive(Debug)]
pub struct UserRecords {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Passthrough(Option<UserRecord>),
    Aggregated {
        sequence_number: String,
        partition_keys: Vec<String>,
        explicit_hash_keys: Vec<String>,
        subs: std::vec::IntoIter<SubRecord>,
        next_sub_sequence: u64,
    },
}

impl UserRecords {
    fn passthrough(record: UserRecord) -> Self {
        Self { inner: Inner::Passthrough(Some(record)) }
    }

    fn aggregated(sequence_number: String, record: AggregatedRecord) -> Self {
        Self {
            inner: Inner::Aggregated {
                sequence_number,
                partition_keys: record.partition_key_table,
                explicit_hash_keys: record.explicit_hash_key_table,
                subs: record.records.into_iter(),
                next_sub_sequence: 0,
            },
        }
    }

    pub fn is_aggregated(&self) -> bool {
        matches!(self.inner, Inner::Aggregated { .. })
    }
}

impl Iterator for UserRecords {
    type Item = UserRecord;

    fn next(&mut self) -> Option<UserRecord> {
        match &mut self.inner {
            Inner::Passthrough(record) => record.take(),
            Inner::Aggregated {
                sequence_number,
                partition_keys,
                explicit_hash_keys,
                subs,
                next_sub_sequence,
            } => {
                let sub = subs.next()?;
                let sub_sequence_number = *next_sub_sequence;
                *next_sub_sequence += 1;

                // Indices were range-checked by decode_body.
                let partition_key = partition_keys[sub.partition_key_index as usize].clone();
                let explicit_partition_key = sub
                    .explicit_hash_key_index
                    .map(|idx| explicit_hash_keys[idx as usize].clone());

                trace!(
                    sequence_number = %sequence_number,
                    sub_sequence_number,
                    data_len = sub.data.len(),
                    "unpacked user record"
                );

                Some(UserRecord {
                    partition_key,
                    explicit_partition_key,
                    sequence_number: sequence_number.clone(),
                    sub_sequence_number: Some(sub_sequence_number),
                    data: sub.data,
                })
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match &self.inner {
            Inner::Passthrough(record) => usize::from(record.is_some()),
            Inner::Aggregated { subs, .. } => subs.len(),
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for UserRecords {}

/// Validate one raw record and return its user records lazily.
///
/// - No magic prefix: exactly one pass-through record, never an error.
/// - `compute_checksums`: the digest gates the whole record before anything is yielded.
pub fn deaggregate_iter(raw: &RawRecord, compute_checksums: bool) -> Result<UserRecords, KplError> {
    if !is_aggregated(&raw.data) {
        return Ok(UserRecords::passthrough(UserRecord::passthrough(raw)));
    }

    let frame = split_record(&raw.data)?;

    if compute_checksums && !checksum::verify(&frame.body, &frame.checksum) {
        let actual = checksum::compute(&frame.body);
        warn!(
            partition_key = %raw.partition_key,
            sequence_number = %raw.sequence_number,
            "aggregated record failed checksum verification"
        );
        return Err(KplError::ChecksumMismatch {
            expected: frame.checksum,
            actual,
        });
    }

    let record = decode_body(frame.body)?;
    trace!(
        sequence_number = %raw.sequence_number,
        sub_records = record.records.len(),
        partition_keys = record.partition_key_table.len(),
        "decoded aggregated record"
    );

    Ok(UserRecords::aggregated(raw.sequence_number.clone(), record))
}

/// Deliver each user record of `raw` to `per_record`, then report completion.
///
/// `after_record` is invoked exactly once: `Ok(())` after the last record, or
/// the error that stopped this raw record. On error nothing was delivered.
pub fn deaggregate<F, A>(raw: &RawRecord, compute_checksums: bool, mut per_record: F, after_record: A)
where
    F: FnMut(UserRecord),
    A: FnOnce(Result<(), KplError>),
{
    match deaggregate_iter(raw, compute_checksums) {
        Ok(records) => {
            for record in records {
                per_record(record);
            }
            after_record(Ok(()));
        }
        Err(e) => after_record(Err(e)),
    }
}

/// Same decoding as [`deaggregate`], delivered as one completed list.
pub fn deaggregate_sync(raw: &RawRecord, compute_checksums: bool) -> Result<Vec<UserRecord>, KplError> {
    deaggregate_iter(raw, compute_checksums).map(Iterator::collect)
}
