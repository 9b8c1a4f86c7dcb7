// ABOUTME: In-process record store backed by a locked hash map.
// ABOUTME: The write lock spans guard check and patch, making update_if atomic.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::deploy::Deployment;
use crate::types::DeploymentId;

use super::{DeploymentStore, Guard, Patch, StoreError, newest_first};

/// Volatile store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<DeploymentId, Deployment>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "memory store is offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn insert(&self, deployment: &Deployment) -> Result<(), StoreError> {
        self.ensure_online()?;
        let mut rows = self.rows.write();
        if rows.contains_key(&deployment.id) {
            return Err(StoreError::Duplicate { id: deployment.id });
        }
        rows.insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn get(&self, id: &DeploymentId) -> Result<Option<Deployment>, StoreError> {
        self.ensure_online()?;
        Ok(self.rows.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Deployment>, StoreError> {
        self.ensure_online()?;
        let mut rows: Vec<Deployment> = self.rows.read().values().cloned().collect();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn update_if(
        &self,
        id: &DeploymentId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<Deployment>, StoreError> {
        self.ensure_online()?;
        let mut rows = self.rows.write();
        match rows.get_mut(id) {
            Some(row) if guard.matches(row) => {
                patch.apply(row);
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: &DeploymentId) -> Result<bool, StoreError> {
        self.ensure_online()?;
        Ok(self.rows.write().remove(id).is_some())
    }
}
