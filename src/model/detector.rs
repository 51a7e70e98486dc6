//! Shared anomaly model. The fitted baseline is published copy-on-write: readers clone an
//! `Arc` under a short read lock and score without holding it; `fit`/`install` build the
//! replacement outside the lock and swap it in whole.

use super::BaselineModel;
use crate::config::ModelConfig;
use crate::error::{CbhsError, Result};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// How raw isolation scores are mapped into [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Min-max over the vectors scored together in one call. A lone vector always maps to 0.
    #[default]
    Batch,
    /// Min-max against the raw-score range of the training corpus, clamped
    Fitted,
}

pub struct AnomalyModel {
    config: ModelConfig,
    state: RwLock<Option<Arc<BaselineModel>>>,
}

impl AnomalyModel {
    /// Unfitted model; every score call fails with `NotFitted` until `fit` or `install`.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    pub fn with_baseline(config: ModelConfig, baseline: BaselineModel) -> Self {
        Self {
            config,
            state: RwLock::new(Some(Arc::new(baseline))),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit over `vectors` and atomically replace any previous baseline.
    pub fn fit(&self, vectors: &[FeatureVector]) -> Result<Arc<BaselineModel>> {
        let baseline = Arc::new(BaselineModel::fit(vectors, &self.config)?);
        self.publish(Arc::clone(&baseline));
        Ok(baseline)
    }

    /// Replace the current baseline with an already-built one
    pub fn install(&self, baseline: BaselineModel) {
        self.publish(Arc::new(baseline));
    }

    fn publish(&self, baseline: Arc<BaselineModel>) {
        // The guarded value is only ever swapped whole, so a poisoned lock still holds a
        // consistent baseline.
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if guard.replace(baseline).is_some() {
            tracing::info!("baseline replaced");
        }
    }

    /// Current baseline, if fitted
    pub fn snapshot(&self) -> Option<Arc<BaselineModel>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_fitted(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Normalized anomaly scores for vectors scored together, in input order.
    pub fn score_batch(&self, vectors: &[FeatureVector]) -> Result<Vec<f64>> {
        let baseline = self.snapshot().ok_or(CbhsError::NotFitted)?;
        baseline.score_batch(vectors, self.config.normalization, self.config.epsilon)
    }

    /// Anomaly score in [0, 1] for a single vector (a batch of one).
    pub fn score_anomaly(&self, vector: &FeatureVector) -> Result<f64> {
        let scores = self.score_batch(std::slice::from_ref(vector))?;
        scores
            .first()
            .copied()
            .ok_or_else(|| CbhsError::InvalidInput("empty score batch".into()))
    }

    /// True iff the anomaly score is below `threshold`. An unfitted model never
    /// authenticates; other errors are caller contract violations and propagate.
    pub fn is_authenticated(&self, vector: &FeatureVector, threshold: f64) -> Result<bool> {
        match self.score_anomaly(vector) {
            Ok(score) => Ok(score < threshold),
            Err(CbhsError::NotFitted) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.snapshot().ok_or(CbhsError::NotFitted)?.serialize()
    }

    /// Decode `blob` and install it; on error the current state is untouched.
    pub fn deserialize(&self, blob: &[u8]) -> Result<()> {
        let baseline = BaselineModel::deserialize(blob)?;
        self.install(baseline);
        Ok(())
    }
}
