//! Process-local repository for tests and single-node demos.

use super::{BaselineRepository, ModelScope, UserRecord};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<String, UserRecord>>,
    models: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BaselineRepository for InMemoryRepository {
    fn insert_user(&self, record: UserRecord) -> Result<bool> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(&record.uid) {
            return Ok(false);
        }
        users.insert(record.uid.clone(), record);
        Ok(true)
    }

    fn get_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(uid).cloned())
    }

    fn record_attempts(&self, uid: &str, count: u64) -> Result<Option<u64>> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get_mut(uid).map(|u| {
            u.auths += count;
            u.auths
        }))
    }

    fn remove_user(&self, uid: &str) -> Result<bool> {
        let removed = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uid)
            .is_some();
        if removed {
            self.models
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&ModelScope::User(uid.to_string()).key());
        }
        Ok(removed)
    }

    fn save_model(&self, scope: &ModelScope, blob: &[u8]) -> Result<()> {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope.key(), blob.to_vec());
        Ok(())
    }

    fn load_model(&self, scope: &ModelScope) -> Result<Option<Vec<u8>>> {
        let models = self.models.read().unwrap_or_else(PoisonError::into_inner);
        Ok(models.get(&scope.key()).cloned())
    }
}
