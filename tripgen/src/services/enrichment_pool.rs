//! Enrichment Pool
//!
//! Fixed number of tokio workers sharing one record channel. Each worker
//! resolves place names for a record and inserts the enriched record into
//! the shared [`RecordHeap`]. Insert order across workers is unspecified;
//! the heap restores timestamp order on extraction.

use super::ordered_aggregate::RecordHeap;
use super::place_resolver::PlaceResolver;
use crate::models::Record;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const DEFAULT_POOL_SIZE: usize = 5;

/// Outcome counters for one pool run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Records taken from the channel
    pub received: usize,
    /// Records inserted into the heap
    pub enriched: usize,
    /// Records dropped because no accepted place was found
    pub unresolved: usize,
    /// Records dropped because the geocoding call failed
    pub failed: usize,
    /// At least one worker stopped because cancellation was raised, not
    /// because the channel drained
    pub cancelled: bool,
}

/// Why a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    /// Channel closed and empty
    Drained,
    /// Cancellation observed
    Cancelled,
}

#[derive(Default)]
struct Counters {
    received: AtomicUsize,
    enriched: AtomicUsize,
    unresolved: AtomicUsize,
    failed: AtomicUsize,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<Record>>>;

/// Bounded worker pool feeding the ordered aggregate
pub struct EnrichmentPool {
    resolver: Arc<PlaceResolver>,
    size: usize,
}

impl EnrichmentPool {
    /// Create a pool of `size` workers (at least one)
    pub fn new(resolver: Arc<PlaceResolver>, size: usize) -> Self {
        Self {
            resolver,
            size: size.max(1),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every worker to completion.
    ///
    /// Returns only once all workers have exited, either because the channel
    /// is closed and drained or because `cancel` was raised. After a worker
    /// observes cancellation it inserts nothing further.
    pub async fn run(
        &self,
        records: mpsc::Receiver<Record>,
        heap: Arc<RecordHeap>,
        cancel: CancellationToken,
    ) -> PoolReport {
        let records: SharedReceiver = Arc::new(Mutex::new(records));
        let counters = Arc::new(Counters::default());
        let mut workers = JoinSet::new();

        for worker_id in 0..self.size {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&self.resolver),
                Arc::clone(&records),
                Arc::clone(&heap),
                Arc::clone(&counters),
                cancel.clone(),
            ));
        }

        info!(workers = self.size, "Enrichment pool started");

        let mut cancelled = false;
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(exit) => cancelled |= exit == WorkerExit::Cancelled,
                Err(e) => error!(error = %e, "Enrichment worker terminated abnormally"),
            }
        }

        let report = PoolReport {
            received: counters.received.load(Ordering::Relaxed),
            enriched: counters.enriched.load(Ordering::Relaxed),
            unresolved: counters.unresolved.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            cancelled,
        };

        info!(
            received = report.received,
            enriched = report.enriched,
            unresolved = report.unresolved,
            failed = report.failed,
            cancelled = report.cancelled,
            "Enrichment pool finished"
        );

        report
    }
}

async fn worker_loop(
    worker_id: usize,
    resolver: Arc<PlaceResolver>,
    records: SharedReceiver,
    heap: Arc<RecordHeap>,
    counters: Arc<Counters>,
    cancel: CancellationToken,
) -> WorkerExit {
    debug!(worker_id, "Enrichment worker started");

    let exit = loop {
        let record = tokio::select! {
            biased;
            _ = cancel.cancelled() => break WorkerExit::Cancelled,
            next = async { records.lock().await.recv().await } => match next {
                Some(record) => record,
                None => break WorkerExit::Drained,
            },
        };

        counters.received.fetch_add(1, Ordering::Relaxed);
        let (latitude, longitude) = (record.latitude(), record.longitude());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break WorkerExit::Cancelled,
            outcome = resolver.enrich(record) => outcome,
        };

        // Cancellation may have been raised while the call was in flight
        if cancel.is_cancelled() {
            break WorkerExit::Cancelled;
        }

        match outcome {
            Ok(Some(enriched)) => {
                heap.insert(enriched);
                counters.enriched.fetch_add(1, Ordering::Relaxed);
            }
            Ok(None) => {
                debug!(
                    worker_id,
                    latitude,
                    longitude,
                    "No accepted places, record dropped"
                );
                counters.unresolved.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!(
                    worker_id,
                    latitude,
                    longitude,
                    error = %e,
                    "Getting location failed, record dropped"
                );
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    };

    debug!(worker_id, ?exit, "Enrichment worker exited");
    exit
}
