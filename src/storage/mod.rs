//! Per-user baselines, attempt counters and serialized models, behind a repository trait
//! so the auth service never touches ambient global state.

mod encrypted;
mod memory;
pub mod model_file;

pub use encrypted::SecureStore;
pub use memory::InMemoryRepository;

use crate::error::Result;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Enrolled user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    /// Enrollment feature vector
    pub baseline: FeatureVector,
    pub created_ts: i64,
    /// Verification attempts so far
    pub auths: u64,
}

/// Which baseline a serialized model belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelScope {
    Global,
    User(String),
}

impl ModelScope {
    pub fn key(&self) -> String {
        match self {
            ModelScope::Global => "global".to_string(),
            ModelScope::User(uid) => format!("user:{}", uid),
        }
    }
}

pub trait BaselineRepository: Send + Sync {
    /// Insert a new user; `false` if the uid is already taken
    fn insert_user(&self, record: UserRecord) -> Result<bool>;

    fn get_user(&self, uid: &str) -> Result<Option<UserRecord>>;

    /// Add `count` attempts in one step and return the new total; `None` if unknown
    fn record_attempts(&self, uid: &str, count: u64) -> Result<Option<u64>>;

    /// Drop the user and any per-user model; `false` if unknown
    fn remove_user(&self, uid: &str) -> Result<bool>;

    fn save_model(&self, scope: &ModelScope, blob: &[u8]) -> Result<()>;

    fn load_model(&self, scope: &ModelScope) -> Result<Option<Vec<u8>>>;
}
