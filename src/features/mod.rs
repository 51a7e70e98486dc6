//! Behavioral signal -> fixed-length feature vector.
//!
//! Dimension order is a compatibility contract with every fitted baseline:
//!
//! | idx   | feature                                                  |
//! |-------|----------------------------------------------------------|
//! | 0–3   | latency mean, std, p75, variance                         |
//! | 4–6   | keystroke interval mean, std, range (0 when < 2 events)  |
//! | 7–9   | decision time mean, std, p90                             |
//! | 10–12 | acceleration mean, std, max                              |
//! | 13    | pattern accuracy as a fraction                           |

mod extractor;
mod stats;
#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use extractor::{extract_features, FeatureExtractor};
pub use stats::{diff, mean, percentile, population_std, population_variance};

use crate::error::{CbhsError, Result};
use serde::{Deserialize, Serialize};

/// Length of every feature vector produced by [`FeatureExtractor`]
pub const FEATURE_DIM: usize = 14;

/// Raw signals captured during one interaction session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBehavioralSample {
    /// Response-time measurements (ms)
    pub latencies: Vec<f64>,
    /// Key event timestamps, non-decreasing
    pub keystroke_timestamps: Vec<f64>,
    pub decision_times: Vec<f64>,
    /// Acceleration magnitudes, non-negative
    pub accel_magnitudes: Vec<f64>,
    /// Percentage in 0–100
    pub pattern_accuracy: f64,
}

/// Ordered feature values for one sample; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Accept a vector handed in by a collaborator or built by the extractor
    pub fn try_from_values(values: Vec<f64>) -> Result<Self> {
        if values.len() != FEATURE_DIM {
            return Err(CbhsError::DimensionMismatch {
                expected: FEATURE_DIM,
                actual: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(CbhsError::InvalidInput(format!(
                "feature {} is not finite",
                i
            )));
        }
        Ok(Self { values })
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}
