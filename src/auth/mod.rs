//! Enrollment and verification on top of the feature extractor and anomaly model.

mod service;
mod verdict;

pub use service::{AuthService, Registration, ScoreSource, UserStatus, Verification};
pub use verdict::{AuthDecision, RiskLevel, VerdictEngine};
