// ABOUTME: One-click convenience flows built from single engine operations.
// ABOUTME: Quick deploy only creates; quick rollback demotes whatever is live.

use crate::clock::Clock;
use crate::store::DeploymentStore;

use super::deployment::{Deployment, NewDeployment};
use super::engine::Engine;
use super::error::DeployError;
use crate::types::DeploymentStatus;

/// What a quick rollback did.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickRollback {
    /// The production deployment that was rolled back.
    pub rolled_back: Deployment,
    /// The earlier deployment whose version was requested. Not reactivated.
    pub target: Deployment,
}

impl<S: DeploymentStore, C: Clock> Engine<S, C> {
    /// Create a deployment from a shortcut. Leaves it `pending`.
    pub async fn quick_deploy(&self, spec: NewDeployment) -> Result<Deployment, DeployError> {
        self.create(spec).await
    }

    /// Roll back the live production deployment in favour of `target_version`.
    ///
    /// The target is the newest other successful deployment of that version.
    /// It is recorded on the rollback event but its row is not touched;
    /// bringing the version back means creating a new deployment.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::NoLiveDeployment` if nothing is live in
    /// production, `DeployError::NoRollbackTarget` if no other successful
    /// deployment has the version, and any error `rollback` returns.
    pub async fn quick_rollback(&self, target_version: &str) -> Result<QuickRollback, DeployError> {
        let rows = self.store.list().await?;
        let wanted = target_version.trim();

        // Rows are newest first, so the first match is the current one.
        let live = rows
            .iter()
            .find(|d| d.is_live())
            .cloned()
            .ok_or(DeployError::NoLiveDeployment)?;

        let target = rows
            .iter()
            .filter(|d| d.id != live.id)
            .find(|d| d.status == DeploymentStatus::Success && d.version.as_str() == wanted)
            .cloned()
            .ok_or_else(|| DeployError::NoRollbackTarget(wanted.to_string()))?;

        tracing::info!(
            "Rolling back live deployment {} ({}) in favour of {}",
            live.id,
            live.version,
            target.version
        );

        let rolled_back = self
            .rollback_towards(&live.id, Some(target.version.as_str()))
            .await?;

        Ok(QuickRollback {
            rolled_back,
            target,
        })
    }
}
