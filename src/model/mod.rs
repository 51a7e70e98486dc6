//! Isolation-forest baseline: fit once over enrollment vectors, score new vectors against it.

mod baseline;
mod detector;
pub mod forest;

pub use baseline::{BaselineModel, ScoreRange, RECOMMENDED_MIN_CORPUS};
pub use detector::{AnomalyModel, NormalizationMode};
pub use forest::{IsolationForest, IsolationTree};
