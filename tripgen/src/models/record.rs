//! Photo record

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// One geotagged, timestamped photo record.
///
/// Created by the record source with no places. The place resolver produces
/// the enriched copy via [`Record::with_places`]; there is no mutable access
/// after that.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    places: BTreeSet<String>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            places: BTreeSet::new(),
        }
    }

    /// Consume the record and return it with the given place names attached
    pub fn with_places<I, S>(self, places: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            places: places.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Resolved place names (deduplicated, ascending)
    pub fn places(&self) -> &BTreeSet<String> {
        &self.places
    }
}
