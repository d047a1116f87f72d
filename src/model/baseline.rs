//! Per-dimension mean/std reference computed from the training window.

use super::ModelError;
use crate::features::FEATURE_DIM;
use ndarray::{Array1, Array2, Axis};

/// Added to every fitted std, and the floor for hand-built baselines.
pub const STD_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    mean: [f64; FEATURE_DIM],
    std: [f64; FEATURE_DIM],
}

fn to_dims(a: Array1<f64>) -> [f64; FEATURE_DIM] {
    let mut out = [0.0; FEATURE_DIM];
    for (o, v) in out.iter_mut().zip(a.iter()) {
        *o = *v;
    }
    out
}

impl Baseline {
    /// Population mean and std (ddof = 0) of the samples, std shifted by [`STD_EPSILON`].
    pub fn fit(samples: &[[f64; FEATURE_DIM]]) -> Result<Self, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTraining);
        }
        let flat: Vec<f64> = samples.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((samples.len(), FEATURE_DIM), flat)?;
        let mean = matrix.mean_axis(Axis(0)).ok_or(ModelError::EmptyTraining)?;
        let std = matrix.std_axis(Axis(0), 0.0) + STD_EPSILON;
        Ok(Self::from_parts(to_dims(mean), to_dims(std)))
    }

    /// Baseline from known statistics; std below [`STD_EPSILON`] is raised to it.
    pub fn from_parts(mean: [f64; FEATURE_DIM], std: [f64; FEATURE_DIM]) -> Self {
        Self {
            mean,
            std: std.map(|s| if s.is_nan() { STD_EPSILON } else { s.max(STD_EPSILON) }),
        }
    }

    pub fn mean(&self) -> &[f64; FEATURE_DIM] {
        &self.mean
    }

    pub fn std(&self) -> &[f64; FEATURE_DIM] {
        &self.std
    }

    /// Maximum absolute z-score across dimensions.
    pub fn score(&self, v: &[f64; FEATURE_DIM]) -> f64 {
        v.iter()
            .zip(&self.mean)
            .zip(&self.std)
            .map(|((x, m), s)| ((x - m) / s).abs())
            .fold(0.0, f64::max)
    }
}
