//! Pipeline Orchestrator
//!
//! Wires the stages of one run together:
//! - **Source**: CSV records streamed from a producer task
//! - **Enrichment**: worker pool resolving place names into the record heap
//! - **Grouping**: single pass over the heap in timestamp order
//!
//! Grouping starts only after every enrichment worker has exited, so the
//! heap is complete when it is drained.

use crate::config::AppConfig;
use crate::error::PipelineResult;
use crate::models::Visit;
use crate::services::{
    generate_titles, AcceptedTypes, EnrichmentPool, GoogleGeocoder, PlaceResolver, PoolReport,
    RecordHeap, RecordSource, ReverseGeocoder, SourceStats, VisitGrouper,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Titles generated for one place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripTitles {
    pub place: String,
    pub titles: Vec<String>,
}

/// Result of a completed (or cancelled) run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// One visit per distinct place, keyed by place name
    pub visits: BTreeMap<String, Visit>,
    pub report: PoolReport,
    pub source_stats: SourceStats,
}

impl PipelineOutcome {
    /// Titles for every visit, in place-name order
    pub fn titles(&self) -> Vec<TripTitles> {
        self.visits
            .values()
            .map(|visit| TripTitles {
                place: visit.place().to_string(),
                titles: generate_titles(visit),
            })
            .collect()
    }

    pub fn cancelled(&self) -> bool {
        self.report.cancelled
    }
}

/// Source → enrichment pool → record heap → visit grouper
pub struct TripPipeline {
    pool: EnrichmentPool,
    grouper: VisitGrouper,
}

impl TripPipeline {
    pub fn new(
        geocoder: Arc<dyn ReverseGeocoder>,
        accepted_types: AcceptedTypes,
        pool_size: usize,
    ) -> Self {
        let resolver = Arc::new(PlaceResolver::new(geocoder, accepted_types));
        Self {
            pool: EnrichmentPool::new(resolver, pool_size),
            grouper: VisitGrouper::new(),
        }
    }

    /// Build the production pipeline backed by the Google geocoder
    pub fn from_config(config: &AppConfig) -> PipelineResult<Self> {
        let geocoder = GoogleGeocoder::new(config.geocoder_config())?;
        Ok(Self::new(
            Arc::new(geocoder),
            AcceptedTypes::default(),
            config.pool_size,
        ))
    }

    /// Run the pipeline over `source`.
    ///
    /// On cancellation the pool drains, nothing further is inserted, and
    /// the records enriched so far are still grouped.
    pub async fn run(
        &self,
        source: RecordSource,
        cancel: CancellationToken,
    ) -> PipelineResult<PipelineOutcome> {
        let run_id = Uuid::new_v4();
        self.run_stages(source, cancel)
            .instrument(info_span!("pipeline", %run_id))
            .await
    }

    async fn run_stages(
        &self,
        source: RecordSource,
        cancel: CancellationToken,
    ) -> PipelineResult<PipelineOutcome> {
        info!(workers = self.pool.size(), "Pipeline started");

        let heap = Arc::new(RecordHeap::new());
        let (records, producer) = source.spawn(self.pool.size(), cancel.clone());

        // Barrier: returns only after every worker has exited
        let report = self
            .pool
            .run(records, Arc::clone(&heap), cancel.clone())
            .await;

        // The receiver is gone once the pool returns, so the producer
        // cannot stay blocked on a full channel
        let source_stats = producer.await?;

        if report.cancelled {
            warn!(
                enriched = report.enriched,
                "Pipeline cancelled, grouping records enriched so far"
            );
        }

        let visits = self.grouper.group(&heap);

        info!(
            records = source_stats.emitted,
            skipped = source_stats.skipped,
            enriched = report.enriched,
            visits = visits.len(),
            "Pipeline finished"
        );

        Ok(PipelineOutcome {
            visits,
            report,
            source_stats,
        })
    }
}
