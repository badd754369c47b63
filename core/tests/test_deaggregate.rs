// Deaggregation tests:
//
// * pass-through of non-aggregated records
// * callback, sync and iterator entry points agree
// * checksum gate delivers nothing on mismatch
// * decode failures stay local to one raw record in a batch

use bytes::Bytes;

use kpl_agg_core::aggregation::RecordAggregator;
use kpl_agg_core::constants::KPL_AGGREGATED_MAGIC;
use kpl_agg_core::deaggregation::{
    deaggregate, deaggregate_all, deaggregate_batch, deaggregate_iter, deaggregate_sync,
};
use kpl_agg_core::framing::{encode_record, AggregatedRecord, FrameError, SubRecord};
use kpl_agg_core::records::{PendingRecord, RawRecord, UserRecord};
use kpl_agg_core::types::KplError;

const SEQ: &str = "49590338271490256608559692538361571095921575989136588898";

fn aggregated_raw(records: Vec<PendingRecord>) -> RawRecord {
    let mut aggregator = RecordAggregator::new();
    for record in records {
        assert!(aggregator.add_user_record(record).unwrap().is_none());
    }
    aggregator.clear_and_get().unwrap().unwrap().into_raw(SEQ)
}

fn two_record_raw() -> RawRecord {
    aggregated_raw(vec![
        PendingRecord::new("a", vec![1u8; 10]),
        PendingRecord::new("b", vec![2u8; 10]),
    ])
}

// # 1. Pass-through

#[test]
fn plain_record_passes_through_verbatim() {
    let raw = RawRecord::new("pk-plain", SEQ, Bytes::from_static(b"{\"hello\":\"world\"}"));

    let records = deaggregate_sync(&raw, true).unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.partition_key, "pk-plain");
    assert_eq!(record.sequence_number, SEQ);
    assert_eq!(record.sub_sequence_number, None);
    assert_eq!(record.explicit_partition_key, None);
    assert_eq!(record.data, raw.data);
    assert!(!record.is_aggregated());
}

#[test]
fn short_and_empty_payloads_pass_through() {
    for data in [Bytes::new(), Bytes::from_static(&[0xF3, 0x89, 0x9A])] {
        let raw = RawRecord::new("pk", "1", data.clone());
        let records = deaggregate_sync(&raw, true).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, data);
    }
}

// # 2. Aggregated record unpacks in wire order

#[test]
fn two_record_aggregate_unpacks_in_order() {
    let raw = two_record_raw();

    let records = deaggregate_sync(&raw, true).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].partition_key, "a");
    assert_eq!(records[1].partition_key, "b");
    assert_eq!(records[0].sub_sequence_number, Some(0));
    assert_eq!(records[1].sub_sequence_number, Some(1));
    assert_eq!(records[0].data.as_ref(), &[1u8; 10]);
    assert_eq!(records[1].data.as_ref(), &[2u8; 10]);
    for r in &records {
        assert_eq!(r.sequence_number, SEQ);
    }
}

#[test]
fn explicit_hash_key_is_resolved_per_sub_record() {
    let raw = aggregated_raw(vec![
        PendingRecord::new("a", &b"one"[..]).with_explicit_hash_key("123"),
        PendingRecord::new("b", &b"two"[..]),
        PendingRecord::new("c", &b"three"[..]).with_explicit_hash_key("123"),
    ]);

    let records = deaggregate_sync(&raw, true).unwrap();

    assert_eq!(records[0].explicit_partition_key.as_deref(), Some("123"));
    assert_eq!(records[1].explicit_partition_key, None);
    assert_eq!(records[2].explicit_partition_key.as_deref(), Some("123"));
}

// # 3. Callback form

#[test]
fn callback_form_delivers_then_completes() {
    let raw = two_record_raw();
    let mut seen: Vec<UserRecord> = Vec::new();
    let mut completions = 0;

    deaggregate(&raw, true, |r| seen.push(r), |result| {
        assert!(result.is_ok());
        completions += 1;
    });

    assert_eq!(completions, 1);
    assert_eq!(seen, deaggregate_sync(&raw, true).unwrap());
}

#[test]
fn iterator_is_exact_size_and_lazy() {
    let raw = two_record_raw();
    let mut records = deaggregate_iter(&raw, true).unwrap();

    assert!(records.is_aggregated());
    assert_eq!(records.len(), 2);
    assert_eq!(records.next().unwrap().sub_sequence_number, Some(0));
    assert_eq!(records.len(), 1);
    assert_eq!(records.next().unwrap().sub_sequence_number, Some(1));
    assert!(records.next().is_none());
}

// # 4. Checksum gate

#[test]
fn flipped_bit_fails_checksum_and_delivers_nothing() {
    let raw = two_record_raw();
    let mut data = raw.data.to_vec();
    // last byte of the body lies inside the second record's payload
    let idx = data.len() - 17;
    data[idx] ^= 0x01;
    let corrupt = RawRecord::new(raw.partition_key.clone(), SEQ, data);

    let mut delivered = 0;
    let mut outcome = None;
    deaggregate(&corrupt, true, |_| delivered += 1, |result| outcome = Some(result));

    assert_eq!(delivered, 0);
    match outcome {
        Some(Err(KplError::ChecksumMismatch { expected, actual })) => assert_ne!(expected, actual),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn checksum_can_be_skipped() {
    let raw = two_record_raw();
    let mut data = raw.data.to_vec();
    let idx = data.len() - 17;
    data[idx] ^= 0x01;
    let corrupt = RawRecord::new("a", SEQ, data);

    let records = deaggregate_sync(&corrupt, false).unwrap();

    assert_eq!(records.len(), 2);
    assert_ne!(records[1].data.as_ref(), &[2u8; 10]);
}

#[test]
fn corrupted_trailing_digest_is_a_mismatch() {
    let raw = two_record_raw();
    let mut data = raw.data.to_vec();
    let last = data.len() - 1;
    data[last] ^= 0xFF;

    let err = deaggregate_sync(&RawRecord::new("a", SEQ, data), true).unwrap_err();
    assert!(err.is_checksum_mismatch());
}

// # 5. Decode failures

fn wire_with_body(body: &[u8]) -> RawRecord {
    let mut data = KPL_AGGREGATED_MAGIC.to_vec();
    data.extend_from_slice(body);
    data.extend_from_slice(&kpl_agg_core::checksum::compute(body));
    RawRecord::new("pk", SEQ, data)
}

#[test]
fn malformed_body_is_protobuf_decode_error() {
    let raw = wire_with_body(&[0x1A, 0x64, 0x01]);

    let err = deaggregate_sync(&raw, true).unwrap_err();
    assert!(err.is_protobuf_decode(), "{err}");
}

#[test]
fn out_of_range_index_is_reported() {
    let record = AggregatedRecord {
        partition_key_table: vec!["a".into()],
        explicit_hash_key_table: vec![],
        records: vec![SubRecord {
            partition_key_index: 1,
            explicit_hash_key_index: None,
            data: Bytes::from_static(b"x"),
            tags: Vec::new(),
        }],
    };
    let raw = RawRecord::new("a", SEQ, encode_record(&record).unwrap());

    let mut delivered = 0;
    let mut outcome = None;
    deaggregate(&raw, false, |_| delivered += 1, |result| outcome = Some(result));

    assert_eq!(delivered, 0);
    let err = outcome.unwrap().unwrap_err();
    assert!(err.is_table_index_out_of_range());
}

#[test]
fn magic_without_digest_is_truncated() {
    let mut data = KPL_AGGREGATED_MAGIC.to_vec();
    data.push(0x00);

    let err = deaggregate_sync(&RawRecord::new("pk", SEQ, data), false).unwrap_err();
    assert!(matches!(err, KplError::Frame(FrameError::Truncated { len: 5 })));
}

// # 6. Batches isolate failures

#[test]
fn batch_failure_does_not_abort_other_records() {
    let good = two_record_raw();
    let bad = wire_with_body(&[0x1A, 0x64, 0x01]);
    let plain = RawRecord::new("p", "7", Bytes::from_static(b"plain"));
    let batch = vec![good, bad, plain];

    let mut delivered: Vec<UserRecord> = Vec::new();
    let mut failures: Vec<(String, KplError)> = Vec::new();

    let counters = deaggregate_batch(
        &batch,
        true,
        |r| delivered.push(r),
        |raw, e| failures.push((raw.sequence_number.clone(), e)),
    );

    assert_eq!(delivered.len(), 3);
    assert_eq!(delivered[2].data.as_ref(), b"plain");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, SEQ);
    assert!(failures[0].1.is_protobuf_decode());

    assert_eq!(counters.raw_records, 3);
    assert_eq!(counters.aggregated_records, 1);
    assert_eq!(counters.passthrough_records, 1);
    assert_eq!(counters.decode_failures, 1);
    assert_eq!(counters.user_records, 3);
}

#[test]
fn deaggregate_all_reports_failure_positions() {
    let batch = vec![
        RawRecord::new("p", "1", Bytes::from_static(b"plain")),
        wire_with_body(&[0x1A, 0x64, 0x01]),
        two_record_raw(),
    ];

    let (records, failures) = deaggregate_all(&batch, true);

    assert_eq!(records.len(), 3);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 1);
}

#[test]
fn empty_batch_yields_nothing() {
    let (records, failures) = deaggregate_all(&[], true);
    assert!(records.is_empty());
    assert!(failures.is_empty());
}
