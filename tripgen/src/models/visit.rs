//! Visit interval

use chrono::{DateTime, Duration, Utc};

/// Time interval during which photos were taken at one place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    place: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Visit {
    /// Open a visit at a single instant
    pub fn starting_at(place: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            place: place.into(),
            start: timestamp,
            end: timestamp,
        }
    }

    /// Build a visit with an explicit interval
    pub fn new(place: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            place: place.into(),
            start,
            end,
        }
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Move the end of the visit forward. Grouping is the only writer.
    pub(crate) fn extend_to(&mut self, timestamp: DateTime<Utc>) {
        self.end = timestamp;
    }
}
