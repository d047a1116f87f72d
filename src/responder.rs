//! Active response: isolate an anomalous source through the sensor's command API.
//! Best effort: one attempt per request, failures are logged and reported as `false`.

use crate::config::ResponderConfig;
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("command request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sensor answered {0}")]
    Status(StatusCode),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("mitigation queue closed")]
    QueueClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MitigationRequest {
    pub source_address: String,
    pub score: f64,
}

#[derive(Serialize)]
struct CommandPayload<'a> {
    cmd: &'a str,
}

/// ARP-ban isolation command for one address.
pub fn isolation_command(address: &str) -> String {
    format!("set arp.spoof.targets {}; arp.ban on", address)
}

/// Sending half of the mitigation queue, held by the detector.
#[derive(Debug, Clone)]
pub struct MitigationQueue {
    tx: UnboundedSender<MitigationRequest>,
}

impl MitigationQueue {
    pub fn channel() -> (Self, UnboundedReceiver<MitigationRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue without waiting for the command to run.
    pub fn dispatch(&self, request: MitigationRequest) -> Result<(), DispatchError> {
        self.tx.send(request).map_err(|_| DispatchError::QueueClosed)
    }
}

pub struct MitigationResponder {
    config: ResponderConfig,
    client: reqwest::Client,
}

impl MitigationResponder {
    pub fn new(config: ResponderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    async fn execute(&self, cmd: &str) -> Result<(), ResponderError> {
        let res = self
            .client
            .post(&self.config.command_url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&CommandPayload { cmd })
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(ResponderError::Status(res.status()));
        }
        Ok(())
    }

    /// Send the isolation command. `true` only when the sensor answers 200.
    pub async fn respond(&self, request: &MitigationRequest) -> bool {
        if request.source_address.is_empty() {
            debug!("mitigation request without source address ignored");
            return false;
        }
        warn!(
            source = %request.source_address,
            score = request.score,
            "MITIGATION TRIGGERED: isolating source"
        );
        let cmd = isolation_command(&request.source_address);
        match self.execute(&cmd).await {
            Ok(()) => {
                info!(%cmd, "mitigation command executed");
                true
            }
            Err(e) => {
                error!(error = %e, %cmd, "mitigation command failed");
                false
            }
        }
    }

    /// Drain the queue, running each request as its own task.
    pub fn spawn_dispatcher(
        self: Arc<Self>,
        mut requests: UnboundedReceiver<MitigationRequest>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                let responder = Arc::clone(&self);
                tokio::spawn(async move {
                    responder.respond(&request).await;
                });
            }
            debug!("mitigation queue closed; dispatcher stopping");
        })
    }
}
