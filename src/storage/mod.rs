//! Scored record store: append-only CSV read by the dashboard.

mod writer;

pub use writer::RecordWriter;

use crate::features::FeatureVector;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

/// Column order is part of the reader contract; never reorder.
pub const CSV_HEADER: &str = "size,is_tcp,is_udp,dst_port,score,is_anomaly,timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One scored feature vector, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub size: u64,
    pub is_tcp: bool,
    pub is_udp: bool,
    pub dst_port: u64,
    pub score: f64,
    pub is_anomaly: bool,
    pub timestamp: DateTime<Utc>,
}

impl ScoredRecord {
    /// Stamp a scored vector with the current time.
    pub fn new(features: &FeatureVector, score: f64, is_anomaly: bool) -> Self {
        Self {
            size: features.size,
            is_tcp: features.is_tcp,
            is_udp: features.is_udp,
            dst_port: features.dst_port,
            score,
            is_anomaly,
            timestamp: Utc::now(),
        }
    }

    /// Append this record as one CSV line (booleans as 0/1).
    pub fn write_row(&self, out: &mut String) {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            self.size,
            u8::from(self.is_tcp),
            u8::from(self.is_udp),
            self.dst_port,
            self.score,
            u8::from(self.is_anomaly),
            self.timestamp.format(TIMESTAMP_FORMAT)
        );
    }
}
