//! Sentinel engine — streaming network anomaly detection with active response.
//!
//! Modular structure:
//! - [`collectors`] — Sensor websocket ingestion, event shapes, diagnostic samples
//! - [`features`] — Per-event feature extraction
//! - [`model`] — Train-then-score z-score anomaly detector
//! - [`storage`] — Buffered CSV record store
//! - [`responder`] — Remote isolation commands
//! - [`pipeline`] — Wiring and main loop
//! - [`logging`] — Structured logging

pub mod config;
pub mod collectors;
pub mod features;
pub mod model;
pub mod storage;
pub mod responder;
pub mod pipeline;
pub mod logging;

pub use config::SentinelConfig;
pub use collectors::{RawEvent, SensorClient, SniffPayload};
pub use features::{extract, FeatureVector};
pub use model::{AnomalyDetector, Baseline, Outcome};
pub use storage::{RecordWriter, ScoredRecord};
pub use responder::{MitigationQueue, MitigationRequest, MitigationResponder};
pub use pipeline::Pipeline;
pub use logging::StructuredLogger;
