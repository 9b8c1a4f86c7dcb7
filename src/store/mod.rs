// ABOUTME: Record store abstraction with conditional (compare-and-set) updates.
// ABOUTME: Exports the store trait, guards, patches, and the memory and file backends.

mod error;
mod file;
mod lock;
mod memory;

pub use error::{StoreError, StoreErrorKind};
pub use file::FileStore;
pub use lock::{LockInfo, StoreLock};
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::deploy::{Deployment, Transition};
use crate::types::{DeploymentId, DeploymentStatus, Environment};

/// Durable storage for deployment rows, one row per id.
///
/// `update_if` is the only mutation of an existing row. Implementations must
/// check the guard and apply the patch as one atomic step so concurrent
/// callers cannot both observe the same previous status.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Persist a new row. Fails with `Duplicate` if the id is taken.
    async fn insert(&self, deployment: &Deployment) -> Result<(), StoreError>;

    /// Fetch a row by id.
    async fn get(&self, id: &DeploymentId) -> Result<Option<Deployment>, StoreError>;

    /// Every row, newest first.
    async fn list(&self) -> Result<Vec<Deployment>, StoreError>;

    /// Apply `patch` if the row exists and satisfies `guard`.
    ///
    /// Returns the updated row, or `None` when nothing was written.
    async fn update_if(
        &self,
        id: &DeploymentId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<Deployment>, StoreError>;

    /// Remove a row unconditionally. Returns whether a row was removed.
    async fn delete(&self, id: &DeploymentId) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: DeploymentStore + ?Sized> DeploymentStore for Arc<S> {
    async fn insert(&self, deployment: &Deployment) -> Result<(), StoreError> {
        (**self).insert(deployment).await
    }

    async fn get(&self, id: &DeploymentId) -> Result<Option<Deployment>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Deployment>, StoreError> {
        (**self).list().await
    }

    async fn update_if(
        &self,
        id: &DeploymentId,
        guard: &Guard,
        patch: &Patch,
    ) -> Result<Option<Deployment>, StoreError> {
        (**self).update_if(id, guard, patch).await
    }

    async fn delete(&self, id: &DeploymentId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

/// Expected persisted state for a conditional write.
///
/// The guard pins the exact status the caller observed, so a transition that
/// raced with another writer fails even if its edge is also legal from the
/// status the other writer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    status: DeploymentStatus,
    can_rollback: Option<bool>,
}

impl Guard {
    /// Match rows whose persisted status is `status`.
    pub fn status(status: DeploymentStatus) -> Self {
        Self {
            status,
            can_rollback: None,
        }
    }

    /// Additionally require the rollback eligibility flag to equal `expected`.
    pub fn can_rollback(mut self, expected: bool) -> Self {
        self.can_rollback = Some(expected);
        self
    }

    /// Guard for applying `transition` to a row observed as `observed`.
    pub fn observed(observed: &Deployment, transition: Transition) -> Self {
        let guard = Self::status(observed.status);
        match transition {
            Transition::Rollback => guard.can_rollback(true),
            _ => guard,
        }
    }

    pub fn matches(&self, deployment: &Deployment) -> bool {
        deployment.status == self.status
            && self
                .can_rollback
                .is_none_or(|expected| deployment.can_rollback == expected)
    }
}

/// Field changes written by a transition. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub status: Option<DeploymentStatus>,
    pub environment: Option<Environment>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u64>,
    pub can_rollback: Option<bool>,
    pub error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Patch {
    /// An empty patch that only bumps `updated_at`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            status: None,
            environment: None,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            can_rollback: None,
            error_message: None,
            updated_at: now,
        }
    }

    pub fn apply(&self, deployment: &mut Deployment) {
        if let Some(status) = self.status {
            deployment.status = status;
        }
        if let Some(environment) = self.environment {
            deployment.environment = environment;
        }
        if let Some(started_at) = self.started_at {
            deployment.started_at = Some(started_at);
        }
        if let Some(completed_at) = self.completed_at {
            deployment.completed_at = Some(completed_at);
        }
        if let Some(duration) = self.duration_seconds {
            deployment.duration_seconds = duration;
        }
        if let Some(can_rollback) = self.can_rollback {
            deployment.can_rollback = can_rollback;
        }
        if let Some(ref message) = self.error_message {
            deployment.error_message = Some(message.clone());
        }
        deployment.updated_at = self.updated_at;
    }
}

/// Sort rows newest first, breaking ties by id for a stable order.
pub(crate) fn newest_first(rows: &mut [Deployment]) {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::NewDeployment;

    fn row(status: DeploymentStatus, can_rollback: bool) -> Deployment {
        let mut d = NewDeployment::new("api", "1.0.0")
            .into_pending(DeploymentId::generate(), Utc::now())
            .unwrap();
        d.status = status;
        d.can_rollback = can_rollback;
        d
    }

    #[test]
    fn guard_pins_observed_status() {
        let observed = row(DeploymentStatus::Pending, true);
        let guard = Guard::observed(&observed, Transition::Cancel);
        assert!(guard.matches(&observed));
        assert!(!guard.matches(&row(DeploymentStatus::InProgress, true)));
    }

    #[test]
    fn rollback_guard_requires_eligibility() {
        let observed = row(DeploymentStatus::Success, true);
        let guard = Guard::observed(&observed, Transition::Rollback);
        assert!(guard.matches(&observed));
        assert!(!guard.matches(&row(DeploymentStatus::Success, false)));
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut d = row(DeploymentStatus::Pending, true);
        let before = d.clone();
        let now = Utc::now();
        let mut patch = Patch::at(now);
        patch.status = Some(DeploymentStatus::InProgress);
        patch.started_at = Some(now);
        patch.apply(&mut d);

        assert_eq!(d.status, DeploymentStatus::InProgress);
        assert_eq!(d.started_at, Some(now));
        assert_eq!(d.completed_at, before.completed_at);
        assert_eq!(d.environment, before.environment);
        assert_eq!(d.updated_at, now);
    }
}
