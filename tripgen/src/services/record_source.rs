//! Record Source
//!
//! Reads `timestamp,latitude,longitude` lines and streams parsed records to
//! the enrichment pool over a bounded channel. Malformed lines are dropped;
//! they never end the stream.

use crate::models::Record;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tripgen_common::time::parse_timestamp;

/// Number of fields in a record line
const FIELD_COUNT: usize = 3;

/// Why a single line could not become a record
#[derive(Debug, Error, PartialEq)]
pub enum RecordParseError {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),

    #[error("parsing timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("parsing latitude: {0:?}")]
    InvalidLatitude(String),

    #[error("parsing longitude: {0:?}")]
    InvalidLongitude(String),
}

/// Counters reported by the producer when it finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Records sent downstream
    pub emitted: usize,
    /// Lines dropped (wrong field count, unparseable field, bad encoding)
    pub skipped: usize,
}

/// Parse one CSV row into a record with no places
pub fn parse_line(row: &StringRecord) -> Result<Record, RecordParseError> {
    if row.len() != FIELD_COUNT {
        return Err(RecordParseError::FieldCount(row.len()));
    }

    let timestamp = parse_timestamp(&row[0])
        .ok_or_else(|| RecordParseError::InvalidTimestamp(row[0].to_string()))?;

    let latitude = parse_coordinate(&row[1])
        .ok_or_else(|| RecordParseError::InvalidLatitude(row[1].to_string()))?;

    let longitude = parse_coordinate(&row[2])
        .ok_or_else(|| RecordParseError::InvalidLongitude(row[2].to_string()))?;

    Ok(Record::new(timestamp, latitude, longitude))
}

fn parse_coordinate(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Line-oriented input of photo records
pub struct RecordSource {
    reader: Box<dyn Read + Send>,
}

impl RecordSource {
    /// Open the CSV file at `path`.
    ///
    /// Failing to open the input is fatal for a run and is reported before
    /// any enrichment starts.
    pub fn open(path: &Path) -> tripgen_common::Result<Self> {
        let file = File::open(path)?;
        info!(path = %path.display(), "Opened record source");
        Ok(Self::from_reader(file))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// Start the producer on the blocking pool.
    ///
    /// The returned channel closes when the input is exhausted, when
    /// `cancel` is raised (checked before every line), or when every
    /// receiver has been dropped.
    pub fn spawn(
        self,
        capacity: usize,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<Record>, JoinHandle<SourceStats>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::task::spawn_blocking(move || self.produce(tx, cancel));
        (rx, handle)
    }

    fn produce(self, tx: mpsc::Sender<Record>, cancel: CancellationToken) -> SourceStats {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(self.reader);

        let mut stats = SourceStats::default();
        let mut row = StringRecord::new();

        loop {
            if cancel.is_cancelled() {
                debug!("Record source cancelled");
                break;
            }

            match reader.read_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => {
                    error!(error = %e, "Reading record source failed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable line");
                    stats.skipped += 1;
                    continue;
                }
            }

            let line = row.position().map(|p| p.line()).unwrap_or_default();

            match parse_line(&row) {
                Ok(record) => {
                    if tx.blocking_send(record).is_err() {
                        debug!("Record receiver dropped, stopping source");
                        break;
                    }
                    stats.emitted += 1;
                }
                Err(RecordParseError::FieldCount(found)) => {
                    debug!(line, found, "Skipping line with wrong field count");
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!(line, error = %e, "Skipping malformed record");
                    stats.skipped += 1;
                }
            }
        }

        info!(
            emitted = stats.emitted,
            skipped = stats.skipped,
            "Record source finished"
        );

        stats
    }
}
