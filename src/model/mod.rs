//! Online z-score anomaly detection: fit a baseline once, then score every vector.

mod baseline;
mod detector;

pub use baseline::{Baseline, STD_EPSILON};
pub use detector::{AnomalyDetector, Outcome};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot fit a baseline from zero samples")]
    EmptyTraining,
    #[error("training matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
