//! telemetry/counters.rs
//! Counters collected while packing and unpacking.
//!
//! Summary: one plain struct per pipeline run, returned to the caller when
//! the run completes. Workers never share it, so no atomics or locks.
use std::ops::AddAssign;

use serde::Serialize;

/// Deterministic counters collected during aggregation or deaggregation
#[derive(Default, Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TelemetryCounters {
    // --- consumer side ---
    pub raw_records: u64,
    pub aggregated_records: u64,
    pub passthrough_records: u64,
    pub user_records: u64,
    pub decode_failures: u64,

    // --- producer side ---
    pub records_in: u64,
    pub records_rejected: u64,
    pub aggregates_sealed: u64,
    pub bytes_emitted: u64,
    pub puts_succeeded: u64,
    pub put_failures: u64,
}

impl TelemetryCounters {
    /// Record one raw record that unpacked into `user_records` records.
    pub fn add_deaggregated(&mut self, aggregated: bool, user_records: usize) {
        self.raw_records += 1;
        if aggregated {
            self.aggregated_records += 1;
        } else {
            self.passthrough_records += 1;
        }
        self.user_records += user_records as u64;
    }

    pub fn add_decode_failure(&mut self) {
        self.raw_records += 1;
        self.decode_failures += 1;
    }

    /// Record one sealed aggregate of `wire_len` bytes.
    pub fn add_sealed(&mut self, wire_len: usize) {
        self.aggregates_sealed += 1;
        self.bytes_emitted += wire_len as u64;
    }

    /// Mean sub-records per sealed aggregate.
    pub fn packing_ratio(&self) -> f64 {
        if self.aggregates_sealed == 0 {
            return 0.0;
        }
        (self.records_in - self.records_rejected) as f64 / self.aggregates_sealed as f64
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.raw_records += other.raw_records;
        self.aggregated_records += other.aggregated_records;
        self.passthrough_records += other.passthrough_records;
        self.user_records += other.user_records;
        self.decode_failures += other.decode_failures;

        self.records_in += other.records_in;
        self.records_rejected += other.records_rejected;
        self.aggregates_sealed += other.aggregates_sealed;
        self.bytes_emitted += other.bytes_emitted;
        self.puts_succeeded += other.puts_succeeded;
        self.put_failures += other.put_failures;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
