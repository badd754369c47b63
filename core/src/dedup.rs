//! Insertion-ordered value → index table.
//!
//! Backs the partition-key and explicit-hash-key tables of one in-progress
//! aggregate. A hash map gives O(1) lookup, an append-only list keeps wire
//! order; an aggregate may hold hundreds of sub-records over a handful of keys.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct DedupTable {
    index: HashMap<String, u64>,
    values: Vec<String>,
}

impl DedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `value`, appending it first if unseen.
    pub fn intern(&mut self, value: &str) -> u64 {
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.values.len() as u64;
        self.index.insert(value.to_owned(), idx);
        self.values.push(value.to_owned());
        idx
    }

    /// Index of `value` if already interned.
    #[inline]
    pub fn get(&self, value: &str) -> Option<u64> {
        self.index.get(value).copied()
    }

    /// Index `value` would receive: its existing slot or the next free one.
    #[inline]
    pub fn peek_index(&self, value: &str) -> (u64, bool) {
        match self.get(value) {
            Some(idx) => (idx, true),
            None => (self.values.len() as u64, false),
        }
    }

    pub fn value_at(&self, index: u64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
