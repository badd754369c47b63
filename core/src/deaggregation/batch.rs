use tracing::{debug, warn};

use crate::deaggregation::deaggregate::deaggregate_iter;
use crate::records::{RawRecord, UserRecord};
use crate::telemetry::TelemetryCounters;
use crate::types::KplError;

/// Deaggregate a batch of raw records in order.
///
/// A failure on one raw record is handed to `on_failure` with that record and
/// processing moves on to the next; it never aborts the batch.
pub fn deaggregate_batch<'a, I, F, E>(
    raws: I,
    compute_checksums: bool,
    mut per_record: F,
    mut on_failure: E,
) -> TelemetryCounters
where
    I: IntoIterator<Item = &'a RawRecord>,
    F: FnMut(UserRecord),
    E: FnMut(&'a RawRecord, KplError),
{
    let mut counters = TelemetryCounters::default();

    for raw in raws {
        match deaggregate_iter(raw, compute_checksums) {
            Ok(records) => {
                let aggregated = records.is_aggregated();
                let count = records.len();
                records.for_each(&mut per_record);
                counters.add_deaggregated(aggregated, count);
            }
            Err(e) => {
                warn!(
                    sequence_number = %raw.sequence_number,
                    error = %e,
                    "skipping undecodable raw record"
                );
                counters.add_decode_failure();
                on_failure(raw, e);
            }
        }
    }

    debug!(
        raw_records = counters.raw_records,
        user_records = counters.user_records,
        decode_failures = counters.decode_failures,
        "batch deaggregated"
    );
    counters
}

/// Collect every user record of a batch, returning failures alongside.
///
/// Failures carry the position of the raw record within `raws`.
pub fn deaggregate_all(
    raws: &[RawRecord],
    compute_checksums: bool,
) -> (Vec<UserRecord>, Vec<(usize, KplError)>) {
    let mut records = Vec::with_capacity(raws.len());
    let mut failures = Vec::new();

    for (position, raw) in raws.iter().enumerate() {
        match deaggregate_iter(raw, compute_checksums) {
            Ok(user_records) => records.extend(user_records),
            Err(e) => failures.push((position, e)),
        }
    }
    (records, failures)
}
