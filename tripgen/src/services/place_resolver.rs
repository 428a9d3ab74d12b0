//! Place Resolver
//!
//! Turns the raw candidates of one reverse geocoding call into the
//! deduplicated set of place names attached to a record.

use super::geocoding_client::{GeocodeError, PlaceCandidate, ReverseGeocoder};
use crate::models::Record;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Type tags treated as a usable "place" granularity by default.
///
/// The geocoding API cannot filter address components by type itself, so
/// this is applied client-side.
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &[
    "country",
    "locality",
    "sublocality",
    "administrative_area_level_3",
    "administrative_area_level_2",
    "administrative_area_level_1",
];

/// Immutable set of accepted type tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTypes(HashSet<String>);

impl AcceptedTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(types.into_iter().map(Into::into).collect())
    }

    /// True when ANY of the candidate's tags is accepted
    pub fn accepts(&self, candidate: &PlaceCandidate) -> bool {
        candidate.types.iter().any(|t| self.0.contains(t))
    }
}

impl Default for AcceptedTypes {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_TYPES.iter().copied())
    }
}

/// Resolves coordinates to place names through a [`ReverseGeocoder`]
pub struct PlaceResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
    accepted_types: AcceptedTypes,
}

impl PlaceResolver {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, accepted_types: AcceptedTypes) -> Self {
        Self {
            geocoder,
            accepted_types,
        }
    }

    /// Accepted place names for one coordinate pair.
    ///
    /// Makes exactly one outbound call. Repeated names collapse to one entry.
    pub async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<BTreeSet<String>, GeocodeError> {
        let candidates = self.geocoder.reverse_geocode(latitude, longitude).await?;

        Ok(candidates
            .into_iter()
            .filter(|candidate| self.accepted_types.accepts(candidate))
            .map(|candidate| candidate.name)
            .collect())
    }

    /// Enrich a record with its place names.
    ///
    /// Returns `Ok(None)` when no candidate survives the type filter; such a
    /// record carries no grouping signal and is dropped by the caller.
    pub async fn enrich(&self, record: Record) -> Result<Option<Record>, GeocodeError> {
        let places = self.resolve(record.latitude(), record.longitude()).await?;

        if places.is_empty() {
            return Ok(None);
        }

        Ok(Some(record.with_places(places)))
    }
}
