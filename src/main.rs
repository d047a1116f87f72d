//! Sentinel engine entrypoint: stream sensor events, score them, persist, and respond.

use sentinel_engine::{config::SentinelConfig, logging::StructuredLogger, pipeline::Pipeline};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("SENTINEL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = SentinelConfig::load(&config_path).apply_env();

    StructuredLogger::init(&config.log)?;

    info!(
        config = %config_path.display(),
        sensor = %config.sensor.url,
        store = %config.storage.path.display(),
        min_samples = config.detector.min_samples,
        threshold = config.detector.threshold,
        "Sentinel engine starting"
    );

    let pipeline = Pipeline::new(config)?;
    pipeline.run().await;

    info!("Sentinel engine stopped");
    Ok(())
}
