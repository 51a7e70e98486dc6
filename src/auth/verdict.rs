//! Maps an anomaly score to an authentication verdict and a risk level.

use crate::config::AuthConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64, config: &AuthConfig) -> Self {
        if score >= config.high_threshold {
            RiskLevel::High
        } else if score >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthDecision {
    pub authenticated: bool,
    pub anomaly_score: f64,
    pub threshold: f64,
    pub level: RiskLevel,
}

pub struct VerdictEngine {
    config: AuthConfig,
}

impl VerdictEngine {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Authenticated iff `score < threshold`
    pub fn decide(&self, score: f64) -> AuthDecision {
        AuthDecision {
            authenticated: score < self.config.threshold,
            anomaly_score: score,
            threshold: self.config.threshold,
            level: RiskLevel::from_score(score, &self.config),
        }
    }

    /// Verdict when no baseline is available to score against
    pub fn fail_closed(&self) -> AuthDecision {
        AuthDecision {
            authenticated: false,
            anomaly_score: 1.0,
            threshold: self.config.threshold,
            level: RiskLevel::High,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
