//! Visit Grouper
//!
//! Single chronological pass over the ordered aggregate that folds records
//! for the same place into one visit.
//!
//! Photos taken at one place are assumed to belong to the same visit when
//! each is within the adjacency window (24 hours) of the visit's current
//! end. A place gets exactly one visit per run: a record beyond the window
//! leaves the existing visit unchanged rather than opening a second one.

use super::ordered_aggregate::RecordHeap;
use crate::models::Visit;
use chrono::Duration;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Maximum gap between consecutive same-place records within one visit
fn adjacency_window() -> Duration {
    Duration::hours(24)
}

/// Groups enriched records into per-place visits
#[derive(Debug, Clone)]
pub struct VisitGrouper {
    window: Duration,
}

impl Default for VisitGrouper {
    fn default() -> Self {
        Self {
            window: adjacency_window(),
        }
    }
}

impl VisitGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `heap` to exhaustion and return one visit per distinct place.
    ///
    /// Must only be called after every producer has finished inserting: a
    /// later insert could carry a timestamp earlier than one already
    /// extracted.
    pub fn group(&self, heap: &RecordHeap) -> BTreeMap<String, Visit> {
        let mut visits: BTreeMap<String, Visit> = BTreeMap::new();
        let mut records = 0usize;

        while let Some(record) = heap.extract_min() {
            records += 1;
            let timestamp = record.timestamp();

            for place in record.places() {
                match visits.entry(place.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(Visit::starting_at(place.as_str(), timestamp));
                    }
                    Entry::Occupied(mut slot) => {
                        let visit = slot.get_mut();
                        if timestamp - visit.end() <= self.window {
                            visit.extend_to(timestamp);
                        } else {
                            trace!(place = %place, %timestamp, "Record outside adjacency window");
                        }
                    }
                }
            }
        }

        debug!(records, visits = visits.len(), "Grouping complete");
        visits
    }
}
