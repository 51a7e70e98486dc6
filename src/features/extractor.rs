//! Raw sample -> 14-dim feature vector. Pure and reentrant.

use super::stats::{self, diff, mean, percentile, population_std, population_variance};
use super::{FeatureVector, RawBehavioralSample, FEATURE_DIM};
use crate::error::{CbhsError, Result};

const LATENCY_PERCENTILE: f64 = 75.0;
const DECISION_PERCENTILE: f64 = 90.0;

pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(sample: &RawBehavioralSample) -> Result<FeatureVector> {
        extract_features(
            &sample.latencies,
            &sample.keystroke_timestamps,
            &sample.decision_times,
            &sample.accel_magnitudes,
            sample.pattern_accuracy,
        )
    }

    /// Extract every sample; fails on the first invalid one
    pub fn extract_batch(samples: &[RawBehavioralSample]) -> Result<Vec<FeatureVector>> {
        samples.iter().map(Self::extract).collect()
    }
}

fn require_signal(name: &str, xs: &[f64]) -> Result<()> {
    if xs.is_empty() {
        return Err(CbhsError::InvalidInput(format!("{} is empty", name)));
    }
    ensure_finite(name, xs)
}

fn ensure_finite(name: &str, xs: &[f64]) -> Result<()> {
    if xs.iter().any(|x| !x.is_finite()) {
        return Err(CbhsError::InvalidInput(format!(
            "{} contains non-finite values",
            name
        )));
    }
    Ok(())
}

pub fn extract_features(
    latencies: &[f64],
    keystroke_timestamps: &[f64],
    decision_times: &[f64],
    accel_magnitudes: &[f64],
    pattern_accuracy: f64,
) -> Result<FeatureVector> {
    require_signal("latencies", latencies)?;
    require_signal("decision_times", decision_times)?;
    require_signal("accel_magnitudes", accel_magnitudes)?;
    ensure_finite("keystroke_timestamps", keystroke_timestamps)?;
    if keystroke_timestamps.windows(2).any(|w| w[1] < w[0]) {
        return Err(CbhsError::InvalidInput(
            "keystroke_timestamps must be non-decreasing".into(),
        ));
    }
    if accel_magnitudes.iter().any(|a| *a < 0.0) {
        return Err(CbhsError::InvalidInput(
            "accel_magnitudes must be non-negative".into(),
        ));
    }
    if !(0.0..=100.0).contains(&pattern_accuracy) {
        return Err(CbhsError::InvalidInput(format!(
            "pattern_accuracy {} outside 0-100",
            pattern_accuracy
        )));
    }

    let mut values = Vec::with_capacity(FEATURE_DIM);

    values.extend([
        mean(latencies),
        population_std(latencies),
        percentile(latencies, LATENCY_PERCENTILE),
        population_variance(latencies),
    ]);

    let intervals = diff(keystroke_timestamps);
    if intervals.is_empty() {
        values.extend([0.0, 0.0, 0.0]);
    } else {
        values.extend([
            mean(&intervals),
            population_std(&intervals),
            stats::max(&intervals) - stats::min(&intervals),
        ]);
    }

    values.extend([
        mean(decision_times),
        population_std(decision_times),
        percentile(decision_times, DECISION_PERCENTILE),
    ]);

    values.extend([
        mean(accel_magnitudes),
        population_std(accel_magnitudes),
        stats::max(accel_magnitudes),
    ]);

    values.push(pattern_accuracy / 100.0);

    // Finite inputs can still overflow (variance, spread), so outputs go through the same gate
    FeatureVector::try_from_values(values)
}
