//! Consumer side: one raw stream record → 1..N user records.
//!
//! Deaggregation is stateless. Each call touches only its own input, so calls
//! over disjoint records can run concurrently without coordination.

pub mod deaggregate;
pub mod batch;

pub use deaggregate::{deaggregate, deaggregate_iter, deaggregate_sync, UserRecords};
pub use batch::{deaggregate_all, deaggregate_batch};
