// ## Bounded emission of sealed aggregates

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::aggregation::accumulator::RecordAggregator;
use crate::aggregation::profile::AggregationProfile;
use crate::records::{EncodedRecord, PendingRecord};
use crate::telemetry::TelemetryCounters;
use crate::types::{KplError, PutError};

/// Result of one handler invocation, sent back to the packer.
struct PutOutcome {
    record: EncodedRecord,
    result: Result<(), PutError>,
}

/// Completion handle passed to `encoded_record_handler` with each aggregate.
///
/// Signal exactly once, either from another thread or before some handler
/// invocation returns. `aggregate` blocks its own thread waiting for
/// completions, so a handle kept for later signalling on that thread never
/// settles. Dropping it without signalling counts as a failed put.
pub struct PutCompletion {
    record: Option<EncodedRecord>,
    tx: Sender<PutOutcome>,
}

impl PutCompletion {
    fn new(record: EncodedRecord, tx: Sender<PutOutcome>) -> Self {
        Self { record: Some(record), tx }
    }

    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, err: impl Into<PutError>) {
        self.complete(Err(err.into()));
    }

    pub fn complete(mut self, result: Result<(), PutError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<(), PutError>) {
        if let Some(record) = self.record.take() {
            // The receiver outlives every completion: aggregate() waits for all of them.
            let _ = self.tx.send(PutOutcome { record, result });
        }
    }
}

impl Drop for PutCompletion {
    fn drop(&mut self) {
        self.send(Err("put completion dropped without a result".into()));
    }
}

impl std::fmt::Debug for PutCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutCompletion")
            .field("pending", &self.record.is_some())
            .finish()
    }
}

/// Owns the in-flight counter and the handler; hands aggregates out in
/// seal order and settles completions in whatever order they arrive.
struct Emitter<H, E> {
    handler: H,
    on_error: E,
    queue_size: usize,
    in_flight: usize,
    tx: Sender<PutOutcome>,
    rx: Receiver<PutOutcome>,
    counters: TelemetryCounters,
}

impl<H, E> Emitter<H, E>
where
    H: FnMut(EncodedRecord, PutCompletion),
    E: FnMut(KplError, Option<EncodedRecord>),
{
    fn new(handler: H, on_error: E, queue_size: usize) -> Self {
        let (tx, rx) = unbounded();
        Self {
            handler,
            on_error,
            queue_size,
            in_flight: 0,
            tx,
            rx,
            counters: TelemetryCounters::default(),
        }
    }

    /// Hand one aggregate to the handler, blocking while the queue is full.
    fn dispatch(&mut self, record: EncodedRecord) {
        while self.in_flight >= self.queue_size {
            self.wait_one();
        }

        self.in_flight += 1;
        self.counters.add_sealed(record.data.len());
        debug!(
            partition_key = %record.partition_key,
            bytes = record.data.len(),
            in_flight = self.in_flight,
            "dispatching aggregated record"
        );

        let completion = PutCompletion::new(record.clone(), self.tx.clone());
        (self.handler)(record, completion);

        // Pick up handlers that completed synchronously.
        while let Ok(outcome) = self.rx.try_recv() {
            self.settle(outcome);
        }
    }

    fn wait_one(&mut self) {
        match self.rx.recv() {
            Ok(outcome) => self.settle(outcome),
            // Unreachable while `self.tx` is alive; never spin on it.
            Err(_) => self.in_flight = 0,
        }
    }

    fn settle(&mut self, outcome: PutOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome.result {
            Ok(()) => self.counters.puts_succeeded += 1,
            Err(e) => {
                self.counters.put_failures += 1;
                warn!(
                    partition_key = %outcome.record.partition_key,
                    error = %e,
                    "put of aggregated record failed"
                );
                (self.on_error)(KplError::PutFailure(e), Some(outcome.record));
            }
        }
    }

    /// Report an error that cost `lost` user records.
    fn reject(&mut self, err: KplError, lost: usize) {
        self.counters.records_rejected += lost as u64;
        warn!(error = %err, "record rejected by aggregator");
        (self.on_error)(err, None);
    }

    /// Completion barrier: wait until every dispatched put has settled.
    fn finish(mut self) -> TelemetryCounters {
        while self.in_flight > 0 {
            self.wait_one();
        }
        self.counters
    }
}

/// Pack `records` into size-bounded aggregates and hand them to the sink.
///
/// - `encoded_record_handler` is called on this thread, in input order, with
///   at most `profile.queue_size` invocations outstanding.
/// - `error_callback` receives `SizeLimitExceeded` for records that cannot fit
///   (without a record) and `PutFailure` with the exact aggregate that failed.
/// - `after_put_aggregated_records` runs exactly once, after the final seal
///   and after every dispatched put has completed.
///
/// This thread blocks while `queue_size` puts are outstanding and again at
/// the barrier. A completion must therefore be signalled from another thread,
/// or from inside a handler invocation (the current one or a later one). A
/// completion held for signalling on this thread after `aggregate` returns
/// deadlocks it.
///
/// Nothing is retried. Only an invalid profile is returned as `Err`, before
/// any callback runs.
pub fn aggregate<I, R, H, A, E>(
    records: I,
    encoded_record_handler: H,
    after_put_aggregated_records: A,
    error_callback: E,
    profile: AggregationProfile,
) -> Result<TelemetryCounters, KplError>
where
    I: IntoIterator<Item = R>,
    R: Into<PendingRecord>,
    H: FnMut(EncodedRecord, PutCompletion),
    A: FnOnce(),
    E: FnMut(KplError, Option<EncodedRecord>),
{
    profile.validate()?;

    let mut aggregator = RecordAggregator::with_max_sub_records(profile.max_sub_records);
    let mut emitter = Emitter::new(encoded_record_handler, error_callback, profile.queue_size);

    for record in records {
        emitter.counters.records_in += 1;
        match aggregator.add_user_record(record.into()) {
            Ok(Some(sealed)) => emitter.dispatch(sealed),
            Ok(None) => {}
            Err(e) => emitter.reject(e, 1),
        }
    }

    let pending = aggregator.num_user_records();
    match aggregator.clear_and_get() {
        Ok(Some(sealed)) => emitter.dispatch(sealed),
        Ok(None) => {}
        Err(e) => emitter.reject(e, pending),
    }

    let counters = emitter.finish();
    debug!(
        aggregates = counters.aggregates_sealed,
        put_failures = counters.put_failures,
        "all aggregated records settled"
    );

    after_put_aggregated_records();
    Ok(counters)
}
