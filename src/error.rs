//! Error kinds surfaced by extraction, scoring, persistence and the auth service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CbhsError {
    /// Empty or malformed raw signal arrays, out-of-range accuracy, bad feature payloads
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Scoring before any successful fit or deserialize
    #[error("Model not fitted")]
    NotFitted,

    /// Persisted blob that cannot be scored with the current feature layout
    #[error("Incompatible model: {0}")]
    IncompatibleModel(String),

    #[error("User already registered: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CbhsError>;
