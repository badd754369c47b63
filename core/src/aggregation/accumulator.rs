use tracing::debug;

use crate::constants::{field_tags, DEFAULT_MAX_SUB_RECORDS, MAX_RECORD_SIZE, RECORD_OVERHEAD};
use crate::dedup::DedupTable;
use crate::framing::{encode_record, sub_record_len, table_entry_len, AggregatedRecord, SubRecord};
use crate::records::{EncodedRecord, PendingRecord};
use crate::types::KplError;

/// Encoded size of `record` packed alone into a fresh aggregate.
pub fn lone_record_size(record: &PendingRecord) -> usize {
    let mut size = RECORD_OVERHEAD
        + table_entry_len(field_tags::PARTITION_KEY_TABLE, &record.partition_key);

    if let Some(ehk) = &record.explicit_hash_key {
        size += table_entry_len(field_tags::EXPLICIT_HASH_KEY_TABLE, ehk);
    }

    size + sub_record_len(0, record.explicit_hash_key.as_ref().map(|_| 0), record.data.len())
}

/// The current in-progress aggregate.
///
/// Tracks the exact encoded size as records are added, accounting for key
/// dedup: a repeated key costs only its index reference. The tables live as
/// long as one aggregate and are discarded when it is sealed.
#[derive(Debug)]
pub struct RecordAggregator {
    partition_keys: DedupTable,
    explicit_hash_keys: DedupTable,
    records: Vec<SubRecord>,
    body_len: usize,
    max_sub_records: usize,
}

impl Default for RecordAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordAggregator {
    pub fn new() -> Self {
        Self::with_max_sub_records(DEFAULT_MAX_SUB_RECORDS)
    }

    pub fn with_max_sub_records(max_sub_records: usize) -> Self {
        Self {
            partition_keys: DedupTable::new(),
            explicit_hash_keys: DedupTable::new(),
            records: Vec::new(),
            body_len: 0,
            max_sub_records: max_sub_records.max(1),
        }
    }

    pub fn num_user_records(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact wire length the current aggregate would have if sealed now.
    pub fn size_bytes(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        RECORD_OVERHEAD + self.body_len
    }

    /// Body bytes `record` would add to the current aggregate.
    fn growth(&self, record: &PendingRecord) -> usize {
        let mut grow = 0;

        let (pk_index, pk_seen) = self.partition_keys.peek_index(&record.partition_key);
        if !pk_seen {
            grow += table_entry_len(field_tags::PARTITION_KEY_TABLE, &record.partition_key);
        }

        let ehk_index = record.explicit_hash_key.as_deref().map(|ehk| {
            let (idx, seen) = self.explicit_hash_keys.peek_index(ehk);
            if !seen {
                grow += table_entry_len(field_tags::EXPLICIT_HASH_KEY_TABLE, ehk);
            }
            idx
        });

        grow + sub_record_len(pk_index, ehk_index, record.data.len())
    }

    fn is_full_for(&self, record: &PendingRecord) -> bool {
        self.records.len() >= self.max_sub_records
            || RECORD_OVERHEAD + self.body_len + self.growth(record) > MAX_RECORD_SIZE
    }

    /// Add a record, sealing the current aggregate first if it cannot take it.
    ///
    /// Returns the sealed aggregate, if one was sealed. A record that cannot
    /// fit under the ceiling even alone is rejected with `SizeLimitExceeded`
    /// and the current aggregate is left untouched.
    pub fn add_user_record(&mut self, record: PendingRecord) -> Result<Option<EncodedRecord>, KplError> {
        let lone = lone_record_size(&record);
        if lone > MAX_RECORD_SIZE {
            return Err(KplError::SizeLimitExceeded {
                size: lone,
                limit: MAX_RECORD_SIZE,
            });
        }

        let sealed = if !self.is_empty() && self.is_full_for(&record) {
            self.clear_and_get()?
        } else {
            None
        };

        self.push(record);
        Ok(sealed)
    }

    fn push(&mut self, record: PendingRecord) {
        self.body_len += self.growth(&record);

        let partition_key_index = self.partition_keys.intern(&record.partition_key);
        let explicit_hash_key_index = record
            .explicit_hash_key
            .as_deref()
            .map(|ehk| self.explicit_hash_keys.intern(ehk));

        self.records.push(SubRecord {
            partition_key_index,
            explicit_hash_key_index,
            data: record.data,
            tags: Vec::new(),
        });
    }

    /// Seal the current aggregate and start a fresh one.
    ///
    /// `Ok(None)` when nothing has been added since the last seal.
    pub fn clear_and_get(&mut self) -> Result<Option<EncodedRecord>, KplError> {
        if self.is_empty() {
            return Ok(None);
        }

        let expected_len = self.size_bytes();
        let partition_keys = std::mem::take(&mut self.partition_keys);
        let explicit_hash_keys = std::mem::take(&mut self.explicit_hash_keys);
        let records = std::mem::take(&mut self.records);
        self.body_len = 0;

        // Representative keys come from the first sub-record.
        let first = &records[0];
        let partition_key = partition_keys
            .value_at(first.partition_key_index)
            .unwrap_or_default()
            .to_owned();
        let explicit_hash_key = first
            .explicit_hash_key_index
            .and_then(|idx| explicit_hash_keys.value_at(idx))
            .map(str::to_owned);

        let aggregate = AggregatedRecord {
            partition_key_table: partition_keys.into_values(),
            explicit_hash_key_table: explicit_hash_keys.into_values(),
            records,
        };
        let data = encode_record(&aggregate)?;
        debug_assert_eq!(data.len(), expected_len);

        debug!(
            partition_key = %partition_key,
            sub_records = aggregate.records.len(),
            bytes = data.len(),
            "sealed aggregated record"
        );

        Ok(Some(EncodedRecord {
            partition_key,
            explicit_hash_key,
            data,
        }))
    }
}
