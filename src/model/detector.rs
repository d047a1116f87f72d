//! Two-phase detector: buffer the first `min_samples` vectors, fit a [`Baseline`],
//! then score every later vector, record it, and queue mitigation for anomalies.

use super::Baseline;
use crate::config::DetectorConfig;
use crate::features::{FeatureVector, FEATURE_DIM};
use crate::responder::{MitigationQueue, MitigationRequest};
use crate::storage::{RecordWriter, ScoredRecord};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum State {
    Training(Vec<[f64; FEATURE_DIM]>),
    /// Terminal
    Scoring(Baseline),
}

/// Result of processing one vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Still training; `samples` buffered so far
    Buffered { samples: usize },
    /// This vector completed the training window; nothing was scored
    Trained,
    Scored(ScoredRecord),
}

pub struct AnomalyDetector {
    config: DetectorConfig,
    state: State,
    writer: Arc<RecordWriter>,
    mitigation: Option<MitigationQueue>,
}

impl AnomalyDetector {
    pub fn new(
        config: DetectorConfig,
        writer: Arc<RecordWriter>,
        mitigation: Option<MitigationQueue>,
    ) -> Self {
        let samples = Vec::with_capacity(config.min_samples);
        Self {
            config,
            state: State::Training(samples),
            writer,
            mitigation,
        }
    }

    /// Skip training and start scoring against a known baseline.
    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.state = State::Scoring(baseline);
        self
    }

    pub fn is_training(&self) -> bool {
        matches!(self.state, State::Training(_))
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        match &self.state {
            State::Scoring(b) => Some(b),
            State::Training(_) => None,
        }
    }

    pub fn process(&mut self, features: FeatureVector) -> Outcome {
        let vector = features.as_array();
        let baseline = match &mut self.state {
            State::Training(samples) => {
                samples.push(vector);
                let buffered = samples.len();
                debug!(samples = buffered, "buffered training sample");
                if buffered < self.config.min_samples {
                    return Outcome::Buffered { samples: buffered };
                }
                return match Baseline::fit(samples) {
                    Ok(baseline) => {
                        info!(
                            samples = buffered,
                            mean = ?baseline.mean(),
                            std = ?baseline.std(),
                            "baseline trained; scoring enabled"
                        );
                        self.state = State::Scoring(baseline);
                        Outcome::Trained
                    }
                    Err(e) => {
                        warn!(error = %e, "baseline fit failed; still training");
                        Outcome::Buffered { samples: buffered }
                    }
                };
            }
            State::Scoring(baseline) => baseline,
        };

        let score = baseline.score(&vector);
        let is_anomaly = score > self.config.threshold;
        let record = ScoredRecord::new(&features, score, is_anomaly);
        self.writer.record(record.clone());

        if is_anomaly {
            self.mitigate(&features, score);
        }
        Outcome::Scored(record)
    }

    fn mitigate(&self, features: &FeatureVector, score: f64) {
        let source = features.source.as_deref().unwrap_or("Unknown");
        warn!(source, score, dst_port = features.dst_port, "ANOMALY DETECTED");

        // Summary events carry no source address; they are recorded but never mitigated.
        let (Some(address), Some(queue)) = (&features.source, &self.mitigation) else {
            return;
        };
        let request = MitigationRequest {
            source_address: address.clone(),
            score,
        };
        if let Err(e) = queue.dispatch(request) {
            error!(error = %e, source = %address, "mitigation dispatch failed");
        }
    }
}
