// Aggregation profile: defaults, validation, serde embedding.

use kpl_agg_core::aggregation::AggregationProfile;
use kpl_agg_core::constants::{DEFAULT_MAX_SUB_RECORDS, DEFAULT_QUEUE_SIZE};
use kpl_agg_core::telemetry::TelemetryCounters;

#[test]
fn defaults_are_single_flight() {
    let profile = AggregationProfile::default();
    assert_eq!(profile.queue_size, DEFAULT_QUEUE_SIZE);
    assert_eq!(profile.max_sub_records, DEFAULT_MAX_SUB_RECORDS);
    assert_eq!(profile, AggregationProfile::single_flight());
}

#[test]
fn builders_validate() {
    let profile = AggregationProfile::default().with_queue_size(8).unwrap();
    assert_eq!(profile.queue_size, 8);

    assert!(profile.with_queue_size(0).is_err());
    assert!(profile.with_max_sub_records(0).is_err());
    assert_eq!(profile.with_max_sub_records(500).unwrap().max_sub_records, 500);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let profile: AggregationProfile = serde_json::from_str(r#"{ "queue_size": 4 }"#).unwrap();
    assert_eq!(profile.queue_size, 4);
    assert_eq!(profile.max_sub_records, DEFAULT_MAX_SUB_RECORDS);

    let empty: AggregationProfile = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, AggregationProfile::default());
}

#[test]
fn counters_merge_and_serialize() {
    let mut a = TelemetryCounters::default();
    a.add_sealed(100);
    a.records_in = 4;

    let mut b = TelemetryCounters::default();
    b.add_sealed(50);
    b.records_in = 2;
    b.add_deaggregated(true, 3);

    a += b;
    assert_eq!(a.aggregates_sealed, 2);
    assert_eq!(a.bytes_emitted, 150);
    assert_eq!(a.user_records, 3);
    assert_eq!(a.packing_ratio(), 3.0);

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["bytes_emitted"], 150);
}
