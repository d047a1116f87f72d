//! Engine configuration. Thresholds are static; nothing here is tuned from traffic.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Data directory (diagnostic samples)
    pub data_dir: PathBuf,
    /// Sensor event stream
    pub sensor: SensorConfig,
    /// Baseline training and decision threshold
    pub detector: DetectorConfig,
    /// Scored record store
    pub storage: StorageConfig,
    /// Active response (remote isolation command)
    pub responder: ResponderConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Websocket events endpoint
    pub url: String,
    pub username: String,
    pub password: String,
    /// Only tags starting with this prefix are considered
    pub tag_prefix: String,
    /// Fixed delay between reconnect attempts (seconds)
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples buffered before the baseline is fitted
    pub min_samples: usize,
    /// Max z-score above which a vector is anomalous
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// CSV record store read by the dashboard
    pub path: PathBuf,
    /// Buffered records that force an immediate flush
    pub batch_size: usize,
    /// Background flush interval (seconds)
    pub flush_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// When false anomalies are recorded and logged but never mitigated
    pub enabled: bool,
    /// Sensor command endpoint
    pub command_url: String,
    pub username: String,
    pub password: String,
    /// Per-command request timeout (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            sensor: SensorConfig::default(),
            detector: DetectorConfig::default(),
            storage: StorageConfig::default(),
            responder: ResponderConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8081/api/events".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            tag_prefix: "net.sniff".to_string(),
            reconnect_delay_secs: 5,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            threshold: 3.0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/traffic_log.csv"),
            batch_size: 100,
            flush_interval_secs: 1,
        }
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command_url: "http://127.0.0.1:8081/api/session".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            timeout_secs: 2,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SentinelConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<SentinelConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// Apply `SENTINEL_*` environment overrides for endpoints and credentials.
    /// The same credentials are used for the event stream and the command API.
    pub fn apply_env(mut self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok());
        self
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SENTINEL_API_URL") {
            self.sensor.url = url;
        }
        if let Some(url) = var("SENTINEL_CMD_URL") {
            self.responder.command_url = url;
        }
        if let Some(user) = var("SENTINEL_API_USER") {
            self.sensor.username = user.clone();
            self.responder.username = user;
        }
        if let Some(pass) = var("SENTINEL_API_PASS") {
            self.sensor.password = pass.clone();
            self.responder.password = pass;
        }
    }
}
