//! Services for the trip title pipeline

pub mod enrichment_pool;
pub mod geocoding_client;
pub mod ordered_aggregate;
pub mod place_resolver;
pub mod record_source;
pub mod title_generator;
pub mod visit_grouper;

pub use enrichment_pool::{EnrichmentPool, PoolReport};
pub use geocoding_client::{
    GeocodeError, GeocoderConfig, GoogleGeocoder, PlaceCandidate, ReverseGeocoder,
};
pub use ordered_aggregate::RecordHeap;
pub use place_resolver::{AcceptedTypes, PlaceResolver};
pub use record_source::{RecordParseError, RecordSource, SourceStats};
pub use title_generator::{generate_titles, Phrase, TripKind};
pub use visit_grouper::VisitGrouper;
