use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SUB_RECORDS, DEFAULT_QUEUE_SIZE};
use crate::types::KplError;

/// Aggregation configuration
///
/// The size ceiling and magic prefix are protocol constants and are not part
/// of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationProfile {
    /// Maximum outstanding `encoded_record_handler` invocations.
    pub queue_size: usize,
    /// Maximum sub-records packed into one aggregate.
    pub max_sub_records: usize,
}

impl Default for AggregationProfile {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            max_sub_records: DEFAULT_MAX_SUB_RECORDS,
        }
    }
}

impl AggregationProfile {
    /// One put in flight at a time.
    pub fn single_flight() -> Self {
        Self::default()
    }

    pub fn new(queue_size: usize, max_sub_records: usize) -> Result<Self, KplError> {
        let profile = Self { queue_size, max_sub_records };
        profile.validate()?;
        Ok(profile)
    }

    pub fn with_queue_size(self, queue_size: usize) -> Result<Self, KplError> {
        Self::new(queue_size, self.max_sub_records)
    }

    pub fn with_max_sub_records(self, max_sub_records: usize) -> Result<Self, KplError> {
        Self::new(self.queue_size, max_sub_records)
    }

    pub fn validate(&self) -> Result<(), KplError> {
        if self.queue_size == 0 {
            return Err(KplError::InvalidProfile("queue_size must be at least 1".into()));
        }
        if self.max_sub_records == 0 {
            return Err(KplError::InvalidProfile("max_sub_records must be at least 1".into()));
        }
        Ok(())
    }
}
