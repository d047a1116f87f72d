//! Sensor event collection: websocket ingestion, event decoding, shape recognition.
//! Only the sniffed-traffic shapes in [`SniffPayload`] are forwarded downstream.

mod samples;
mod sensor;

use serde_json::{Map, Value};
use thiserror::Error;

pub use samples::{SampleKind, SampleRecorder};
pub use sensor::{Ingest, SensorClient};

/// Keys under which summary events report their size.
const SIZE_KEYS: [&str; 2] = ["Size", "size"];

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("invalid sensor handshake: {0}")]
    Handshake(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// One decoded sensor message. `raw` keeps the text exactly as received.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub tag: String,
    pub time: Option<String>,
    pub data: Value,
    pub raw: String,
}

impl RawEvent {
    /// Build an event from its parts; `raw` is the compact JSON rendering.
    pub fn new(tag: impl Into<String>, data: Value) -> Self {
        let tag = tag.into();
        let raw = serde_json::json!({ "tag": tag, "data": data }).to_string();
        Self {
            tag,
            time: None,
            data,
            raw,
        }
    }

    /// Decode a text frame. `Ok(None)` when the message has no string `tag`.
    pub fn decode(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;
        let Some(tag) = value.get("tag").and_then(Value::as_str).map(str::to_owned) else {
            return Ok(None);
        };
        let time = value.get("time").and_then(Value::as_str).map(str::to_owned);
        let data = value.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        Ok(Some(Self {
            tag,
            time,
            data,
            raw: text.to_owned(),
        }))
    }

    pub fn payload(&self) -> Option<SniffPayload<'_>> {
        SniffPayload::parse(&self.data)
    }
}

/// Recognized shapes of a sniff event's `data` object.
#[derive(Debug, Clone, Copy)]
pub enum SniffPayload<'a> {
    /// `data.packet`: decoded raw packet with `length`, `ipv4`, `tcp`/`udp` sub-objects.
    Packet(&'a Map<String, Value>),
    /// `data.data`: protocol summary (`Size`), with `protocol` and `to` beside it.
    Summary {
        summary: &'a Map<String, Value>,
        protocol: &'a str,
        to: &'a str,
    },
}

impl<'a> SniffPayload<'a> {
    pub fn parse(data: &'a Value) -> Option<Self> {
        let data = data.as_object()?;
        if let Some(packet) = data.get("packet").and_then(Value::as_object) {
            return Some(SniffPayload::Packet(packet));
        }
        let summary = data.get("data").and_then(Value::as_object)?;
        if !SIZE_KEYS.iter().any(|k| summary.contains_key(*k)) {
            return None;
        }
        let text = move |key: &str| data.get(key).and_then(Value::as_str).unwrap_or("");
        Some(SniffPayload::Summary {
            summary,
            protocol: text("protocol"),
            to: text("to"),
        })
    }

    /// Size field of a summary object, whichever spelling is present.
    pub fn summary_size(summary: &Map<String, Value>) -> Option<&Value> {
        SIZE_KEYS.iter().find_map(|k| summary.get(*k))
    }
}
