//! Ordered Aggregate
//!
//! Thread-safe min-heap of enriched records, keyed by timestamp. Workers
//! insert in any order; extraction always yields the earliest record.
//!
//! Records with identical timestamps come out in an unspecified order.
//! `BinaryHeap` gives no stability guarantee and none is added here.

use crate::models::Record;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Heap entry ordered by timestamp only
#[derive(Debug)]
struct ByTimestamp(Record);

/// Reverse ordering so that `BinaryHeap` (a max-heap) pops the earliest record
impl Ord for ByTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.timestamp().cmp(&self.0.timestamp())
    }
}

impl PartialOrd for ByTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ByTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.0.timestamp() == other.0.timestamp()
    }
}

impl Eq for ByTimestamp {}

/// Concurrency-safe min-heap of records
///
/// A single mutex serializes every insert and extraction. Lock hold time is
/// one heap operation, O(log n).
#[derive(Debug, Default)]
pub struct RecordHeap {
    heap: Mutex<BinaryHeap<ByTimestamp>>,
}

impl RecordHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Never fails.
    pub fn insert(&self, record: Record) {
        self.lock().push(ByTimestamp(record));
    }

    /// Remove and return the earliest record, or `None` when empty.
    ///
    /// `None` only means "empty right now"; callers use it as the end of an
    /// extraction loop once all producers have finished.
    pub fn extract_min(&self) -> Option<Record> {
        self.lock().pop().map(|entry| entry.0)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BinaryHeap<ByTimestamp>> {
        // A panic while holding the lock cannot leave the heap half-updated
        // (push/pop restore the heap property before returning), so recover.
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromIterator<Record> for RecordHeap {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            heap: Mutex::new(iter.into_iter().map(ByTimestamp).collect()),
        }
    }
}
