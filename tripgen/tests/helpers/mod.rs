//! Shared fakes for tripgen integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tripgen::services::{GeocodeError, PlaceCandidate, ReverseGeocoder};

fn coordinate_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}

/// Scripted geocoder: fixed answers per coordinate, empty for unknown ones
#[derive(Default)]
pub struct ScriptedGeocoder {
    answers: HashMap<String, Vec<PlaceCandidate>>,
    failures: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `(latitude, longitude)` with names tagged `locality`
    pub fn with_places(mut self, latitude: f64, longitude: f64, names: &[&str]) -> Self {
        let candidates = names
            .iter()
            .map(|name| PlaceCandidate::new(*name, ["locality", "political"]))
            .collect();
        self.answers.insert(coordinate_key(latitude, longitude), candidates);
        self
    }

    pub fn with_candidates(
        mut self,
        latitude: f64,
        longitude: f64,
        candidates: Vec<PlaceCandidate>,
    ) -> Self {
        self.answers.insert(coordinate_key(latitude, longitude), candidates);
        self
    }

    /// Fail every call for `(latitude, longitude)` with a network error
    pub fn failing_at(mut self, latitude: f64, longitude: f64, message: &str) -> Self {
        self.failures
            .insert(coordinate_key(latitude, longitude), message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = coordinate_key(latitude, longitude);

        if let Some(message) = self.failures.get(&key) {
            return Err(GeocodeError::NetworkError(message.clone()));
        }

        Ok(self.answers.get(&key).cloned().unwrap_or_default())
    }
}

/// Geocoder that takes `delay` per call and always answers with one place
pub struct SlowGeocoder {
    delay: Duration,
    place: String,
    calls: AtomicUsize,
}

impl SlowGeocoder {
    pub fn new(delay: Duration, place: &str) -> Self {
        Self {
            delay,
            place: place.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for SlowGeocoder {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![PlaceCandidate::new(self.place.as_str(), ["locality"])])
    }
}

/// Geocoder whose first `open_calls` calls answer at once; every later call
/// never completes
pub struct GatedGeocoder {
    open_calls: usize,
    place: String,
    calls: AtomicUsize,
}

impl GatedGeocoder {
    pub fn new(open_calls: usize, place: &str) -> Self {
        Self {
            open_calls,
            place: place.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for GatedGeocoder {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.open_calls {
            std::future::pending::<()>().await;
        }
        Ok(vec![PlaceCandidate::new(self.place.as_str(), ["locality"])])
    }
}

/// Geocoder that raises `cancel` from inside call number `cancel_on_call`
/// (1-based) and still answers that call successfully
pub struct CancellingGeocoder {
    cancel_on_call: usize,
    cancel: CancellationToken,
    calls: AtomicUsize,
}

impl CancellingGeocoder {
    pub fn new(cancel_on_call: usize, cancel: CancellationToken) -> Self {
        Self {
            cancel_on_call,
            cancel,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for CancellingGeocoder {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.cancel_on_call {
            self.cancel.cancel();
        }
        Ok(vec![PlaceCandidate::new("London", ["locality"])])
    }
}

/// Write `contents` to a temporary CSV file
pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// `rows` synthetic records, one minute apart, all at the same coordinate
pub fn synthetic_csv(rows: usize) -> String {
    let base = 1_648_462_210i64;
    (0..rows)
        .map(|i| format!("{},51.5072,-0.1276\n", base + (i as i64) * 60))
        .collect()
}
