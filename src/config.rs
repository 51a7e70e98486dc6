//! Service configuration: model hyperparameters, auth thresholds, synthetic bootstrap, logging.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::NormalizationMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CbhsConfig {
    /// Data directory (encrypted store, model file)
    pub data_dir: PathBuf,
    /// Serialized global baseline; relative paths live under `data_dir`
    pub model_path: PathBuf,
    /// Isolation forest parameters
    pub model: ModelConfig,
    /// Authentication thresholds
    pub auth: AuthConfig,
    /// Synthetic baseline bootstrap
    pub synthetic: SyntheticConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Subsample size per tree (capped at corpus size)
    pub max_samples: usize,
    /// Expected outlier share of the training corpus
    pub contamination: f64,
    /// Master seed for tree construction
    pub seed: u64,
    pub normalization: NormalizationMode,
    /// Added to the min-max denominator
    pub epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Authenticated iff anomaly score is below this (0.0–1.0)
    pub threshold: f64,
    /// Score at or above this is medium risk
    pub medium_threshold: f64,
    /// Score at or above this is high risk
    pub high_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Samples drawn from the "normal" profile when no baseline exists
    pub bootstrap_samples: usize,
    /// Fixed seed for reproducible bootstraps; entropy when absent
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for CbhsConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .map(|d| d.join("cbhs"))
                .unwrap_or_else(|| PathBuf::from(".cbhs")),
            model_path: PathBuf::from("cbhs_model.json"),
            model: ModelConfig::default(),
            auth: AuthConfig::default(),
            synthetic: SyntheticConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.05,
            seed: 42,
            normalization: NormalizationMode::Batch,
            epsilon: 1e-8,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            medium_threshold: 0.5,
            high_threshold: 0.8,
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bootstrap_samples: 50,
            seed: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl CbhsConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<CbhsConfig>(&data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults");
                Self::default()
            }
        }
    }

    /// Model file location with relative paths resolved under `data_dir`
    pub fn resolved_model_path(&self) -> PathBuf {
        if self.model_path.is_absolute() {
            self.model_path.clone()
        } else {
            self.data_dir.join(&self.model_path)
        }
    }
}
