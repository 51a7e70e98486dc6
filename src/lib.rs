//! CBHS: continuous behavioral authentication core.
//!
//! Modular structure:
//! - [`features`]: Raw behavioral signals to a fixed 14-dim feature vector
//! - [`model`]: Isolation-forest baseline fitting and anomaly scoring
//! - [`auth`]: Enrollment and verification service, verdict thresholds
//! - [`storage`]: Baseline repository (in-memory, encrypted SQLite) and model files
//! - [`logging`]: Structured JSON logging
//! - [`error`]: Error kinds shared by every module

pub mod auth;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod storage;

pub use auth::{AuthService, VerdictEngine};
pub use config::CbhsConfig;
pub use error::{CbhsError, Result};
pub use features::{extract_features, FeatureExtractor, FeatureVector, RawBehavioralSample, FEATURE_DIM};
pub use logging::StructuredLogger;
pub use model::{AnomalyModel, BaselineModel, NormalizationMode};
pub use storage::{BaselineRepository, InMemoryRepository, SecureStore};
