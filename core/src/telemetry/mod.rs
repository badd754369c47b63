//! telemetry/mod.rs
//! Counters for both pipelines, returned by value at the end of a run.

pub mod counters;

pub use counters::*;
