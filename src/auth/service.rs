//! Auth service: register, enroll, verify, status, logout. All state is passed in:
//! a shared [`AnomalyModel`] for the global baseline and a [`BaselineRepository`] for users.

use super::verdict::{AuthDecision, RiskLevel, VerdictEngine};
use crate::config::AuthConfig;
use crate::error::{CbhsError, Result};
use crate::features::{FeatureExtractor, FeatureVector, RawBehavioralSample};
use crate::model::{AnomalyModel, BaselineModel};
use crate::storage::{BaselineRepository, ModelScope, UserRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub uid: String,
    pub baseline_dim: usize,
}

/// Which baseline produced a verification score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    User,
    Global,
    /// No fitted baseline; verdict failed closed
    Unfitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub id: Uuid,
    pub authenticated: bool,
    pub anomaly_score: f64,
    pub threshold: f64,
    pub user: String,
    pub attempt: u64,
    pub risk_level: RiskLevel,
    pub source: ScoreSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub uid: String,
    pub registered: bool,
    pub baseline_feats: usize,
    pub auth_attempts: u64,
    pub created_ts: i64,
}

pub struct AuthService<R: BaselineRepository> {
    model: Arc<AnomalyModel>,
    repo: R,
    verdicts: VerdictEngine,
}

impl<R: BaselineRepository> AuthService<R> {
    pub fn new(model: Arc<AnomalyModel>, repo: R, config: AuthConfig) -> Self {
        Self {
            model,
            repo,
            verdicts: VerdictEngine::new(config),
        }
    }

    pub fn model(&self) -> &Arc<AnomalyModel> {
        &self.model
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn threshold(&self) -> f64 {
        self.verdicts.config().threshold
    }

    /// Enroll `uid` with a baseline feature vector. `ts` defaults to now (ms).
    pub fn register(&self, uid: &str, feats: Vec<f64>, ts: Option<i64>) -> Result<Registration> {
        if uid.trim().is_empty() {
            return Err(CbhsError::InvalidInput("uid is empty".into()));
        }
        if feats.is_empty() {
            return Err(CbhsError::InvalidInput("no features provided".into()));
        }
        let baseline = FeatureVector::try_from_values(feats)?;
        let baseline_dim = baseline.dim();
        let record = UserRecord {
            uid: uid.to_string(),
            baseline,
            created_ts: ts.unwrap_or_else(|| Utc::now().timestamp_millis()),
            auths: 0,
        };
        if !self.repo.insert_user(record)? {
            return Err(CbhsError::UserExists(uid.to_string()));
        }
        info!(uid = %uid, baseline_dim, "user registered");
        Ok(Registration {
            uid: uid.to_string(),
            baseline_dim,
        })
    }

    /// Fit a per-user baseline from raw enrollment samples and persist it; later
    /// verifications for `uid` score against it instead of the global model.
    pub fn enroll(&self, uid: &str, samples: &[RawBehavioralSample]) -> Result<BaselineModel> {
        if self.repo.get_user(uid)?.is_none() {
            return Err(CbhsError::UserNotFound(uid.to_string()));
        }
        let vectors = FeatureExtractor::extract_batch(samples)?;
        let baseline = BaselineModel::fit(&vectors, self.model.config())?;
        let blob = baseline.serialize()?;
        self.repo.save_model(&ModelScope::User(uid.to_string()), &blob)?;
        info!(uid = %uid, corpus = vectors.len(), "user baseline enrolled");
        Ok(baseline)
    }

    /// Verify one live feature vector for `uid`.
    pub fn verify(&self, uid: &str, feats: Vec<f64>) -> Result<Verification> {
        let mut out = self.verify_batch(uid, vec![feats])?;
        out.pop()
            .ok_or_else(|| CbhsError::InvalidInput("empty verification batch".into()))
    }

    /// Verify several vectors scored together (one normalization batch). Each counts as
    /// an attempt; the whole batch is recorded in one repository call after every vector
    /// has scored, so a failed batch records nothing.
    pub fn verify_batch(&self, uid: &str, batch: Vec<Vec<f64>>) -> Result<Vec<Verification>> {
        if self.repo.get_user(uid)?.is_none() {
            return Err(CbhsError::UserNotFound(uid.to_string()));
        }
        let vectors = batch
            .into_iter()
            .map(FeatureVector::try_from_values)
            .collect::<Result<Vec<_>>>()?;

        let (decisions, source) = self.decide(uid, &vectors)?;

        let total = self
            .repo
            .record_attempts(uid, decisions.len() as u64)?
            .ok_or_else(|| CbhsError::UserNotFound(uid.to_string()))?;
        let first = total + 1 - decisions.len() as u64;

        let mut out = Vec::with_capacity(decisions.len());
        for (attempt, decision) in (first..).zip(decisions) {
            info!(
                uid = %uid,
                attempt,
                score = decision.anomaly_score,
                authenticated = decision.authenticated,
                source = ?source,
                "verification"
            );
            out.push(Verification {
                id: Uuid::new_v4(),
                authenticated: decision.authenticated,
                anomaly_score: decision.anomaly_score,
                threshold: decision.threshold,
                user: uid.to_string(),
                attempt,
                risk_level: decision.level,
                source,
            });
        }
        Ok(out)
    }

    fn decide(&self, uid: &str, vectors: &[FeatureVector]) -> Result<(Vec<AuthDecision>, ScoreSource)> {
        let config = self.model.config();
        if let Some(blob) = self.repo.load_model(&ModelScope::User(uid.to_string()))? {
            let baseline = BaselineModel::deserialize(&blob)?;
            let scores = baseline.score_batch(vectors, config.normalization, config.epsilon)?;
            let decisions = scores.into_iter().map(|s| self.verdicts.decide(s)).collect();
            return Ok((decisions, ScoreSource::User));
        }
        match self.model.score_batch(vectors) {
            Ok(scores) => Ok((
                scores.into_iter().map(|s| self.verdicts.decide(s)).collect(),
                ScoreSource::Global,
            )),
            Err(CbhsError::NotFitted) => {
                warn!(uid = %uid, "no fitted baseline; failing closed");
                Ok((
                    vectors.iter().map(|_| self.verdicts.fail_closed()).collect(),
                    ScoreSource::Unfitted,
                ))
            }
            Err(e) => Err(e),
        }
    }

    pub fn status(&self, uid: &str) -> Result<UserStatus> {
        let user = self
            .repo
            .get_user(uid)?
            .ok_or_else(|| CbhsError::UserNotFound(uid.to_string()))?;
        Ok(UserStatus {
            uid: user.uid,
            registered: true,
            baseline_feats: user.baseline.dim(),
            auth_attempts: user.auths,
            created_ts: user.created_ts,
        })
    }

    /// Remove the user and any per-user baseline
    pub fn logout(&self, uid: &str) -> Result<()> {
        if !self.repo.remove_user(uid)? {
            return Err(CbhsError::UserNotFound(uid.to_string()));
        }
        info!(uid = %uid, "user logged out");
        Ok(())
    }
}

#[cfg(feature = "synthetic")]
mod bootstrap {
    use super::*;
    use crate::config::SyntheticConfig;
    use crate::features::synthetic::{SyntheticCorpus, ANOMALOUS_PROFILE, NORMAL_PROFILE};
    use crate::storage::model_file;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::path::Path;

    impl<R: BaselineRepository> AuthService<R> {
        /// Install the global baseline: model file first, then the repository's global
        /// scope, else fit on synthetic "normal" samples and persist to both.
        pub fn init_global(&self, path: &Path, synthetic: &SyntheticConfig) -> Result<Arc<BaselineModel>> {
            if let Some(baseline) = model_file::load(path)? {
                self.model.install(baseline);
            } else if let Some(blob) = self.repo.load_model(&ModelScope::Global)? {
                self.model.deserialize(&blob)?;
                info!("global baseline loaded from repository");
            } else {
                info!(samples = synthetic.bootstrap_samples, "training synthetic baseline");
                let mut rng = match synthetic.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let vectors = SyntheticCorpus::default().generate_features(
                    synthetic.bootstrap_samples,
                    NORMAL_PROFILE,
                    &mut rng,
                )?;
                let baseline = self.model.fit(&vectors)?;
                model_file::save(path, &baseline)?;
                self.repo.save_model(&ModelScope::Global, &baseline.serialize()?)?;
            }
            self.model.snapshot().ok_or(CbhsError::NotFitted)
        }

        /// One synthetic feature vector: "normal" draws the normal profile, any other
        /// mode the anomalous one.
        pub fn demo_inject<G: Rng + ?Sized>(&self, mode: &str, rng: &mut G) -> Result<FeatureVector> {
            let profile = if mode == NORMAL_PROFILE {
                NORMAL_PROFILE
            } else {
                ANOMALOUS_PROFILE
            };
            SyntheticCorpus::default()
                .generate_features(1, profile, rng)?
                .pop()
                .ok_or_else(|| CbhsError::InvalidInput("empty synthetic batch".into()))
        }
    }
}
