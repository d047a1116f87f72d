//! Pipeline driver: sensor task → event channel → extract → detect → {store, responder}.

use crate::collectors::{RawEvent, SampleRecorder, SensorClient};
use crate::config::SentinelConfig;
use crate::features::extract;
use crate::model::{AnomalyDetector, Outcome};
use crate::responder::{MitigationQueue, MitigationRequest, MitigationResponder};
use crate::storage::RecordWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot create data dir {path:?}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot build mitigation client: {0}")]
    Responder(#[from] reqwest::Error),
}

struct Mitigation {
    responder: Arc<MitigationResponder>,
    requests: UnboundedReceiver<MitigationRequest>,
}

pub struct Pipeline {
    config: SentinelConfig,
    writer: Arc<RecordWriter>,
    detector: AnomalyDetector,
    mitigation: Option<Mitigation>,
}

impl Pipeline {
    pub fn new(config: SentinelConfig) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|source| PipelineError::DataDir {
            path: config.data_dir.clone(),
            source,
        })?;
        let writer = Arc::new(RecordWriter::new(&config.storage));

        let (queue, mitigation) = if config.responder.enabled {
            let responder = Arc::new(MitigationResponder::new(config.responder.clone())?);
            let (queue, requests) = MitigationQueue::channel();
            (Some(queue), Some(Mitigation { responder, requests }))
        } else {
            info!("active response disabled; anomalies are only recorded");
            (None, None)
        };
        let detector = AnomalyDetector::new(config.detector.clone(), Arc::clone(&writer), queue);

        Ok(Self {
            config,
            writer,
            detector,
            mitigation,
        })
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn writer(&self) -> &Arc<RecordWriter> {
        &self.writer
    }

    /// Process one event. `None` when it yields no features.
    pub fn handle(&mut self, event: &RawEvent) -> Option<Outcome> {
        let Some(features) = extract(event) else {
            warn!(tag = %event.tag, "event without usable features skipped");
            return None;
        };
        Some(self.detector.process(features))
    }

    /// Spawn ingestion, flushing and mitigation, then consume events until the sensor task ends.
    pub async fn run(mut self) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sensor = SensorClient::new(
            self.config.sensor.clone(),
            SampleRecorder::new(&self.config.data_dir),
            tx,
        );
        let ingest = tokio::spawn(async move { sensor.run().await });

        let period = Duration::from_secs(self.config.storage.flush_interval_secs.max(1));
        let flusher = Arc::clone(&self.writer).spawn_flusher(period);
        let dispatcher = self
            .mitigation
            .take()
            .map(|m| m.responder.spawn_dispatcher(m.requests));

        info!("Sentinel engine started");
        while let Some(event) = rx.recv().await {
            self.handle(&event);
        }

        warn!("event stream ended");
        ingest.abort();
        flusher.abort();
        let writer = Arc::clone(&self.writer);
        match tokio::task::spawn_blocking(move || writer.flush()).await {
            Ok(Ok(n)) => info!(count = n, "final flush"),
            Ok(Err(e)) => error!(error = %e, "final flush failed; records dropped"),
            Err(e) => error!(error = %e, "final flush task aborted"),
        }
        drop(self.detector);
        if let Some(dispatcher) = dispatcher {
            let _ = dispatcher.await;
        }
    }
}
