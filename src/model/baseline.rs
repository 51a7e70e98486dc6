//! Fitted baseline: isolation forest + centroid + training score range, and its persisted form.

use super::forest::{ForestParams, IsolationForest};
use super::NormalizationMode;
use crate::config::ModelConfig;
use crate::error::{CbhsError, Result};
use crate::features::{percentile, FeatureVector, FEATURE_DIM};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const FORMAT_VERSION: u32 = 1;

/// Corpus size below which the ensemble is considered unstable
pub const RECOMMENDED_MIN_CORPUS: usize = 20;

/// Raw-score extremes observed on the training corpus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    forest: IsolationForest,
    centroid: Vec<f64>,
    feature_dim: usize,
    corpus_size: usize,
    training_range: ScoreRange,
    /// Raw score at the (1 - contamination) quantile of the training corpus
    outlier_cutoff: f64,
}

/// Persisted form. `baseline` is kept as the exact JSON text the checksum covers.
#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    feature_dim: usize,
    fitted: bool,
    checksum: String,
    baseline: String,
}

fn checksum(payload: &str) -> String {
    BASE64.encode(Sha256::digest(payload.as_bytes()))
}

fn check_dim(v: &FeatureVector, expected: usize) -> Result<()> {
    if v.dim() != expected {
        return Err(CbhsError::DimensionMismatch {
            expected,
            actual: v.dim(),
        });
    }
    Ok(())
}

impl BaselineModel {
    /// Fit a fresh baseline over the enrollment corpus.
    pub fn fit(vectors: &[FeatureVector], config: &ModelConfig) -> Result<Self> {
        if vectors.is_empty() {
            return Err(CbhsError::InvalidInput(
                "fit requires at least one feature vector".into(),
            ));
        }
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(CbhsError::InvalidInput(format!(
                "contamination {} outside (0, 0.5]",
                config.contamination
            )));
        }
        for v in vectors {
            check_dim(v, FEATURE_DIM)?;
        }
        if vectors.len() < RECOMMENDED_MIN_CORPUS {
            tracing::warn!(
                corpus = vectors.len(),
                recommended = RECOMMENDED_MIN_CORPUS,
                "small enrollment corpus; isolation scores will be noisy"
            );
        }

        let flat: Vec<f64> = vectors.iter().flat_map(|v| v.as_slice().iter().copied()).collect();
        let data = Array2::from_shape_vec((vectors.len(), FEATURE_DIM), flat)
            .map_err(|e| CbhsError::InvalidInput(e.to_string()))?;

        // Scale before summing so finite extremes cannot overflow the mean
        let centroid = (&data / vectors.len() as f64).sum_axis(Axis(0)).to_vec();

        let forest = IsolationForest::fit(
            &data,
            ForestParams {
                n_estimators: config.n_estimators,
                max_samples: config.max_samples,
                seed: config.seed,
            },
        )?;

        let train_scores: Vec<f64> = vectors
            .par_iter()
            .map(|v| forest.anomaly_score(ArrayView1::from(v.as_slice())))
            .collect();
        let training_range = ScoreRange {
            min: train_scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: train_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        let outlier_cutoff = percentile(&train_scores, 100.0 * (1.0 - config.contamination));

        tracing::info!(
            corpus = vectors.len(),
            trees = forest.trees().len(),
            sample_size = forest.sample_size(),
            dim = FEATURE_DIM,
            "baseline fitted"
        );

        Ok(Self {
            forest,
            centroid,
            feature_dim: FEATURE_DIM,
            corpus_size: vectors.len(),
            training_range,
            outlier_cutoff,
        })
    }

    /// Unnormalized isolation score in (0, 1]; higher is more anomalous
    pub fn raw_score(&self, v: &FeatureVector) -> Result<f64> {
        check_dim(v, self.feature_dim)?;
        Ok(self.forest.anomaly_score(ArrayView1::from(v.as_slice())))
    }

    /// Score a batch and min-max normalize into [0, 1]. Every vector is checked
    /// before any is scored so a bad batch yields no partial result.
    pub fn score_batch(
        &self,
        vectors: &[FeatureVector],
        mode: NormalizationMode,
        epsilon: f64,
    ) -> Result<Vec<f64>> {
        for v in vectors {
            check_dim(v, self.feature_dim)?;
        }
        let raw: Vec<f64> = vectors
            .par_iter()
            .map(|v| self.forest.anomaly_score(ArrayView1::from(v.as_slice())))
            .collect();
        if raw.is_empty() {
            return Ok(raw);
        }

        let (lo, hi) = match mode {
            NormalizationMode::Batch => (
                raw.iter().copied().fold(f64::INFINITY, f64::min),
                raw.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ),
            NormalizationMode::Fitted => (self.training_range.min, self.training_range.max),
        };
        let denom = hi - lo + epsilon;
        Ok(raw
            .into_iter()
            .map(|s| ((s - lo) / denom).clamp(0.0, 1.0))
            .collect())
    }

    /// Raw score beyond the contamination cutoff of the training corpus
    pub fn is_outlier(&self, v: &FeatureVector) -> Result<bool> {
        Ok(self.raw_score(v)? > self.outlier_cutoff)
    }

    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    /// Euclidean distance from the enrollment mean
    pub fn centroid_distance(&self, v: &FeatureVector) -> Result<f64> {
        check_dim(v, self.feature_dim)?;
        Ok(v.as_slice()
            .iter()
            .zip(&self.centroid)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt())
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    pub fn training_range(&self) -> ScoreRange {
        self.training_range
    }

    pub fn outlier_cutoff(&self) -> f64 {
        self.outlier_cutoff
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let baseline = serde_json::to_string(self)?;
        let envelope = Envelope {
            format_version: FORMAT_VERSION,
            feature_dim: self.feature_dim,
            fitted: true,
            checksum: checksum(&baseline),
            baseline,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    /// Rebuild a baseline from [`BaselineModel::serialize`] output. Anything that would
    /// not score against the current 14-dim feature layout is rejected.
    pub fn deserialize(blob: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(blob)
            .map_err(|e| CbhsError::IncompatibleModel(format!("malformed blob: {}", e)))?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(CbhsError::IncompatibleModel(format!(
                "unsupported format version {}",
                envelope.format_version
            )));
        }
        if !envelope.fitted {
            return Err(CbhsError::IncompatibleModel("blob holds no fitted baseline".into()));
        }
        if envelope.feature_dim != FEATURE_DIM {
            return Err(CbhsError::IncompatibleModel(format!(
                "baseline has {} features, extractor produces {}",
                envelope.feature_dim, FEATURE_DIM
            )));
        }
        if checksum(&envelope.baseline) != envelope.checksum {
            return Err(CbhsError::IncompatibleModel("checksum mismatch".into()));
        }

        let model: BaselineModel = serde_json::from_str(&envelope.baseline)
            .map_err(|e| CbhsError::IncompatibleModel(format!("malformed baseline: {}", e)))?;
        if model.feature_dim != envelope.feature_dim || model.centroid.len() != model.feature_dim {
            return Err(CbhsError::IncompatibleModel(
                "baseline dimension disagrees with envelope".into(),
            ));
        }
        model.forest.validate(model.feature_dim)?;
        Ok(model)
    }
}
