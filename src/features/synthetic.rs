//! Synthetic behavioral samples for bootstrapping a baseline when no enrollment data exists.
//! Not on the authentication path; compiled only with the `synthetic` feature.

use super::{FeatureExtractor, FeatureVector, RawBehavioralSample};
use crate::error::{CbhsError, Result};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Exp, Normal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NORMAL_PROFILE: &str = "normal";
pub const ANOMALOUS_PROFILE: &str = "anomalous";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalDistribution {
    Normal { mean: f64, std_dev: f64 },
    Exponential { mean: f64 },
    Uniform { low: f64, high: f64 },
}

impl SignalDistribution {
    fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let bad = |e: &dyn std::fmt::Display| CbhsError::InvalidInput(format!("{:?}: {}", self, e));
        match *self {
            SignalDistribution::Normal { mean, std_dev } => {
                let d = Normal::new(mean, std_dev).map_err(|e| bad(&e))?;
                Ok(d.sample_iter(rng).take(n).collect())
            }
            SignalDistribution::Exponential { mean } => {
                if !(mean > 0.0) {
                    return Err(bad(&"mean must be positive"));
                }
                let d = Exp::new(1.0 / mean).map_err(|e| bad(&e))?;
                Ok(d.sample_iter(rng).take(n).collect())
            }
            SignalDistribution::Uniform { low, high } => {
                if !(low < high) {
                    return Err(bad(&"low must be below high"));
                }
                let d = Uniform::new(low, high);
                Ok(d.sample_iter(rng).take(n).collect())
            }
        }
    }
}

/// Per-signal distribution and draw count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub distribution: SignalDistribution,
    pub len: usize,
}

/// A named behavioral profile; keystroke draws are gaps, cumulative-summed into timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub name: String,
    pub latency: SignalSpec,
    pub keystroke_gap: SignalSpec,
    pub decision_time: SignalSpec,
    pub accel_magnitude: SignalSpec,
    pub pattern_accuracy: SignalDistribution,
}

impl BehaviorProfile {
    /// Relaxed, practiced user
    pub fn normal() -> Self {
        Self {
            name: NORMAL_PROFILE.to_string(),
            latency: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 150.0, std_dev: 30.0 },
                len: 12,
            },
            keystroke_gap: SignalSpec {
                distribution: SignalDistribution::Exponential { mean: 50.0 },
                len: 15,
            },
            decision_time: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 200.0, std_dev: 60.0 },
                len: 10,
            },
            accel_magnitude: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 2.5, std_dev: 0.8 },
                len: 20,
            },
            pattern_accuracy: SignalDistribution::Uniform { low: 70.0, high: 95.0 },
        }
    }

    /// Stressed or altered behavior: slower, more erratic, less accurate
    pub fn anomalous() -> Self {
        Self {
            name: ANOMALOUS_PROFILE.to_string(),
            latency: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 250.0, std_dev: 50.0 },
                len: 12,
            },
            keystroke_gap: SignalSpec {
                distribution: SignalDistribution::Exponential { mean: 80.0 },
                len: 15,
            },
            decision_time: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 100.0, std_dev: 80.0 },
                len: 10,
            },
            accel_magnitude: SignalSpec {
                distribution: SignalDistribution::Normal { mean: 4.5, std_dev: 1.5 },
                len: 20,
            },
            pattern_accuracy: SignalDistribution::Uniform { low: 30.0, high: 60.0 },
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RawBehavioralSample> {
        let latencies = self.latency.distribution.draw(self.latency.len, rng)?;
        let gaps = self.keystroke_gap.distribution.draw(self.keystroke_gap.len, rng)?;
        let keystroke_timestamps = gaps
            .iter()
            .scan(0.0, |t, g| {
                *t += g.max(0.0);
                Some(*t)
            })
            .collect();
        let decision_times = self.decision_time.distribution.draw(self.decision_time.len, rng)?;
        let accel_magnitudes = self
            .accel_magnitude
            .distribution
            .draw(self.accel_magnitude.len, rng)?
            .into_iter()
            .map(|a| a.max(0.0))
            .collect();
        let pattern_accuracy = self
            .pattern_accuracy
            .draw(1, rng)?
            .first()
            .copied()
            .unwrap_or_default()
            .clamp(0.0, 100.0);

        Ok(RawBehavioralSample {
            latencies,
            keystroke_timestamps,
            decision_times,
            accel_magnitudes,
            pattern_accuracy,
        })
    }
}

/// Named profiles; new behaviors plug in without touching scoring
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, BehaviorProfile>,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        let mut r = Self {
            profiles: HashMap::new(),
        };
        r.register(BehaviorProfile::normal());
        r.register(BehaviorProfile::anomalous());
        r
    }
}

impl ProfileRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Add or replace a profile under its own name
    pub fn register(&mut self, profile: BehaviorProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&BehaviorProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Draws corpora from a [`ProfileRegistry`]
pub struct SyntheticCorpus {
    registry: ProfileRegistry,
}

impl Default for SyntheticCorpus {
    fn default() -> Self {
        Self::new(ProfileRegistry::default())
    }
}

impl SyntheticCorpus {
    pub fn new(registry: ProfileRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// `n` raw samples from the named profile
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        profile: &str,
        rng: &mut R,
    ) -> Result<Vec<RawBehavioralSample>> {
        let p = self
            .registry
            .get(profile)
            .ok_or_else(|| CbhsError::InvalidInput(format!("unknown profile '{}'", profile)))?;
        (0..n).map(|_| p.sample(rng)).collect()
    }

    /// `n` samples from the named profile, passed through the extractor
    pub fn generate_features<R: Rng + ?Sized>(
        &self,
        n: usize,
        profile: &str,
        rng: &mut R,
    ) -> Result<Vec<FeatureVector>> {
        let samples = self.generate(n, profile, rng)?;
        FeatureExtractor::extract_batch(&samples)
    }
}
