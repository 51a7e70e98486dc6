//! Seeded fixtures shared by the integration tests.
#![allow(dead_code)]

use cbhs_core::config::ModelConfig;
use cbhs_core::features::synthetic::{SyntheticCorpus, ANOMALOUS_PROFILE, NORMAL_PROFILE};
use cbhs_core::FeatureVector;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn normal_corpus(n: usize, seed: u64) -> Vec<FeatureVector> {
    SyntheticCorpus::default()
        .generate_features(n, NORMAL_PROFILE, &mut rng(seed))
        .unwrap()
}

pub fn anomalous_corpus(n: usize, seed: u64) -> Vec<FeatureVector> {
    SyntheticCorpus::default()
        .generate_features(n, ANOMALOUS_PROFILE, &mut rng(seed))
        .unwrap()
}

pub fn model_config() -> ModelConfig {
    ModelConfig::default()
}

/// Every dimension at ten times the largest value seen in `corpus`
pub fn far_outside(corpus: &[FeatureVector]) -> FeatureVector {
    let dim = corpus[0].dim();
    let values = (0..dim)
        .map(|i| {
            let max = corpus
                .iter()
                .map(|v| v.as_slice()[i])
                .fold(f64::NEG_INFINITY, f64::max);
            max.abs().max(1.0) * 10.0
        })
        .collect();
    FeatureVector::try_from_values(values).unwrap()
}
