//! Sensor event stream client: authenticated websocket, fixed-delay reconnect, sniff filter.

use super::samples::{SampleKind, SampleRecorder};
use super::{RawEvent, SensorError};
use crate::config::SensorConfig;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// What happened to one inbound text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Forwarded,
    /// Not a sniff event, or no recognized payload shape
    Dropped,
    Undecodable,
    /// Downstream receiver is gone
    Closed,
}

enum SessionEnd {
    Disconnected,
    ReceiverGone,
}

pub struct SensorClient {
    config: SensorConfig,
    authorization: String,
    samples: SampleRecorder,
    tx: UnboundedSender<RawEvent>,
}

impl SensorClient {
    pub fn new(config: SensorConfig, samples: SampleRecorder, tx: UnboundedSender<RawEvent>) -> Self {
        let credentials = format!("{}:{}", config.username, config.password);
        let authorization = format!("Basic {}", BASE64.encode(credentials));
        Self {
            config,
            authorization,
            samples,
            tx,
        }
    }

    /// Connect and stream forever; every disconnect waits the fixed reconnect delay.
    /// Returns only when the event receiver has been dropped.
    pub async fn run(&self) {
        let delay = Duration::from_secs(self.config.reconnect_delay_secs);
        loop {
            info!(url = %self.config.url, "connecting to sensor");
            match self.session().await {
                Ok(SessionEnd::ReceiverGone) => {
                    warn!("event receiver dropped; sensor client stopping");
                    return;
                }
                Ok(SessionEnd::Disconnected) => {
                    warn!(delay_secs = delay.as_secs(), "sensor connection closed; reconnecting")
                }
                Err(e) => {
                    error!(error = %e, delay_secs = delay.as_secs(), "sensor connection error; reconnecting")
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    fn request(&self) -> Result<Request, SensorError> {
        let mut request = self.config.url.as_str().into_client_request()?;
        let value = HeaderValue::from_str(&self.authorization)
            .map_err(|e| SensorError::Handshake(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }

    async fn session(&self) -> Result<SessionEnd, SensorError> {
        let (mut ws, _) = connect_async(self.request()?).await?;
        info!("connected to sensor");
        while let Some(frame) = ws.next().await {
            match frame? {
                Message::Text(text) => {
                    if self.ingest(text.as_str()) == Ingest::Closed {
                        return Ok(SessionEnd::ReceiverGone);
                    }
                }
                Message::Close(frame) => {
                    debug!(?frame, "sensor sent close frame");
                    break;
                }
                _ => {}
            }
        }
        Ok(SessionEnd::Disconnected)
    }

    /// Decode, filter and forward one text message.
    pub fn ingest(&self, text: &str) -> Ingest {
        let event = match RawEvent::decode(text) {
            Ok(Some(event)) => event,
            Ok(None) => return Ingest::Dropped,
            Err(e) => {
                debug!(error = %e, "undecodable sensor message skipped");
                return Ingest::Undecodable;
            }
        };
        debug!(tag = %event.tag, "sensor event");
        if !event.tag.starts_with(&self.config.tag_prefix) {
            return Ingest::Dropped;
        }
        if event.payload().is_none() {
            debug!(tag = %event.tag, "sniff event without usable payload skipped");
            return Ingest::Dropped;
        }

        let tag = event.tag.clone();
        let raw = event.raw.clone();
        if self.tx.send(event).is_err() {
            return Ingest::Closed;
        }
        debug!(%tag, "queued sniff event");

        self.sample(SampleKind::First, &raw);
        if tag.contains("tcp") {
            self.sample(SampleKind::Tcp, &raw);
        }
        Ingest::Forwarded
    }

    /// Samples are taken only from events that actually went downstream.
    fn sample(&self, kind: SampleKind, raw: &str) {
        match self.samples.capture(kind, raw) {
            Ok(true) => info!(path = %self.samples.path(kind).display(), "wrote sample event"),
            Ok(false) => {}
            Err(e) => error!(error = %e, ?kind, "failed to write sample event"),
        }
    }
}
