// ABOUTME: The deployment lifecycle engine.
// ABOUTME: Validates each transition against the persisted row and commits it with a conditional write.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::events::{EventKind, EventSink, LifecycleEvent, TracingSink};
use crate::store::{DeploymentStore, Guard, Patch};
use crate::types::{DeploymentId, DeploymentStatus, Environment};

use super::deployment::{Deployment, NewDeployment};
use super::error::DeployError;
use super::filter::DeploymentFilter;
use super::state::{Outcome, Transition};
use super::stats::DeploymentStats;

/// Upper bound on a single event delivery.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// What a promotion did to the row.
#[derive(Debug, Clone, PartialEq)]
pub enum Promotion {
    /// The row moved to production.
    Promoted(Deployment),
    /// The row was already in production and was left untouched.
    AlreadyInProduction(Deployment),
}

impl Promotion {
    pub fn changed(&self) -> bool {
        matches!(self, Promotion::Promoted(_))
    }

    pub fn deployment(&self) -> &Deployment {
        match self {
            Promotion::Promoted(d) | Promotion::AlreadyInProduction(d) => d,
        }
    }

    pub fn into_deployment(self) -> Deployment {
        match self {
            Promotion::Promoted(d) | Promotion::AlreadyInProduction(d) => d,
        }
    }
}

/// Stateless lifecycle engine over a shared record store.
///
/// Holds no per-deployment state: every operation reads the persisted row,
/// checks the requested edge, and writes only if the row still has the status
/// that was read. Any number of engines may share one store.
pub struct Engine<S, C = SystemClock> {
    pub(crate) store: S,
    pub(crate) clock: C,
    events: Arc<dyn EventSink>,
    event_timeout: Duration,
}

impl<S: DeploymentStore> Engine<S> {
    /// Create an engine using the system clock and a tracing event sink.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: DeploymentStore, C: Clock> Engine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            events: Arc::new(TracingSink),
            event_timeout: DEFAULT_EVENT_TIMEOUT,
        }
    }

    /// Replace the event sink.
    pub fn events(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Arc::new(sink);
        self
    }

    /// Bound how long the engine waits on the event sink.
    pub fn event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch a deployment by id.
    pub async fn get(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        self.store
            .get(id)
            .await?
            .ok_or(DeployError::NotFound(*id))
    }

    /// Deployments matching `filter`, newest first.
    pub async fn list(&self, filter: &DeploymentFilter) -> Result<Vec<Deployment>, DeployError> {
        let rows = self.store.list().await?;
        Ok(rows.into_iter().filter(|d| filter.matches(d)).collect())
    }

    /// Aggregate counters over every stored deployment.
    pub async fn stats(&self) -> Result<DeploymentStats, DeployError> {
        let rows = self.store.list().await?;
        Ok(DeploymentStats::collect(&rows, self.clock.now()))
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Record a new deployment in `pending`. Never starts it.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Validation` if the name or version is blank; no
    /// row is written in that case.
    pub async fn create(&self, spec: NewDeployment) -> Result<Deployment, DeployError> {
        let now = self.clock.now();
        let deployment = spec.into_pending(DeploymentId::generate(), now)?;

        self.store.insert(&deployment).await?;
        tracing::info!(
            "Created deployment {} ({} {}) for {}",
            deployment.id,
            deployment.name,
            deployment.version,
            deployment.environment
        );

        self.emit(LifecycleEvent::new(EventKind::Created, &deployment, now))
            .await;
        Ok(deployment)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// pending -> in_progress, stamping `started_at`.
    pub async fn start(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        let transition = Transition::Start;
        let current = self.load_for(id, transition).await?;

        let now = self.clock.now();
        let mut patch = Patch::at(now);
        patch.status = Some(transition.target());
        patch.started_at = Some(now);

        let updated = self.commit(&current, transition, &patch).await?;
        self.emit(LifecycleEvent::new(EventKind::Started, &updated, now))
            .await;
        Ok(updated)
    }

    /// in_progress -> success | failed, stamping `completed_at` and the duration.
    pub async fn complete(
        &self,
        id: &DeploymentId,
        outcome: Outcome,
    ) -> Result<Deployment, DeployError> {
        let transition = Transition::Complete(outcome.kind());
        let current = self.load_for(id, transition).await?;

        let now = self.clock.now();
        let mut patch = Patch::at(now);
        patch.status = Some(transition.target());
        patch.completed_at = Some(now);
        patch.duration_seconds = Some(elapsed_seconds(current.started_at, now));
        patch.error_message = outcome.error_message();

        let updated = self.commit(&current, transition, &patch).await?;
        self.emit(LifecycleEvent::new(EventKind::Completed, &updated, now))
            .await;
        Ok(updated)
    }

    /// pending | in_progress -> cancelled. Timestamps are left as they are.
    pub async fn cancel(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        let transition = Transition::Cancel;
        let current = self.load_for(id, transition).await?;

        let now = self.clock.now();
        let mut patch = Patch::at(now);
        patch.status = Some(transition.target());

        let updated = self.commit(&current, transition, &patch).await?;
        self.emit(LifecycleEvent::new(EventKind::Cancelled, &updated, now))
            .await;
        Ok(updated)
    }

    /// success -> rolled_back, clearing rollback eligibility.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::RollbackNotPermitted` if the deployment was
    /// already rolled back or was created ineligible, and
    /// `DeployError::IllegalTransition` for any other non-success status.
    pub async fn rollback(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        self.rollback_towards(id, None).await
    }

    pub(crate) async fn rollback_towards(
        &self,
        id: &DeploymentId,
        target_version: Option<&str>,
    ) -> Result<Deployment, DeployError> {
        let transition = Transition::Rollback;
        let current = self.load_for(id, transition).await?;

        let now = self.clock.now();
        let mut patch = Patch::at(now);
        patch.status = Some(transition.target());
        patch.can_rollback = Some(false);

        let updated = self.commit(&current, transition, &patch).await?;

        let mut event = LifecycleEvent::new(EventKind::RolledBack, &updated, now);
        if let Some(version) = target_version {
            event = event.with_target_version(version);
        }
        self.emit(event).await;
        Ok(updated)
    }

    /// Move a successful deployment to production without changing its status.
    ///
    /// Promoting a deployment that is already in production is a no-op and
    /// emits no event.
    pub async fn promote(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        self.promote_reporting(id).await.map(Promotion::into_deployment)
    }

    /// Like [`Engine::promote`], but reports whether the row was written.
    pub async fn promote_reporting(&self, id: &DeploymentId) -> Result<Promotion, DeployError> {
        let transition = Transition::Promote;
        let current = self.load_for(id, transition).await?;

        if current.environment.is_production() {
            tracing::debug!("Deployment {} already in production", current.id);
            return Ok(Promotion::AlreadyInProduction(current));
        }

        let now = self.clock.now();
        let mut patch = Patch::at(now);
        patch.environment = Some(Environment::Production);

        let updated = self.commit(&current, transition, &patch).await?;
        self.emit(LifecycleEvent::new(EventKind::Promoted, &updated, now))
            .await;
        Ok(Promotion::Promoted(updated))
    }

    /// Remove a deployment regardless of its status.
    pub async fn delete(&self, id: &DeploymentId) -> Result<Deployment, DeployError> {
        let current = self.get(id).await?;

        if !self.store.delete(id).await? {
            return Err(DeployError::NotFound(*id));
        }
        tracing::info!("Deleted deployment {} ({})", current.id, current.status);

        self.emit(LifecycleEvent::new(
            EventKind::Deleted,
            &current,
            self.clock.now(),
        ))
        .await;
        Ok(current)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Read the row and check that `transition` may leave its status.
    async fn load_for(
        &self,
        id: &DeploymentId,
        transition: Transition,
    ) -> Result<Deployment, DeployError> {
        let current = self.get(id).await?;
        check(&current, transition)?;
        Ok(current)
    }

    /// Conditionally write `patch` against the status observed in `current`.
    async fn commit(
        &self,
        current: &Deployment,
        transition: Transition,
        patch: &Patch,
    ) -> Result<Deployment, DeployError> {
        let guard = Guard::observed(current, transition);

        match self.store.update_if(&current.id, &guard, patch).await? {
            Some(updated) => {
                tracing::info!(
                    "Deployment {}: {} -> {} ({})",
                    updated.id,
                    current.status,
                    updated.status,
                    transition
                );
                Ok(updated)
            }
            None => Err(self.lost_race(&current.id, current.status, transition).await),
        }
    }

    /// Explain a conditional write that affected no row.
    async fn lost_race(
        &self,
        id: &DeploymentId,
        observed: DeploymentStatus,
        transition: Transition,
    ) -> DeployError {
        tracing::debug!(
            "Conditional {} on {} found status changed from {}",
            transition,
            id,
            observed
        );

        match self.store.get(id).await {
            Ok(Some(now)) => check(&now, transition)
                .err()
                .unwrap_or(DeployError::IllegalTransition {
                    id: *id,
                    from: now.status,
                    transition,
                }),
            Ok(None) => DeployError::NotFound(*id),
            Err(e) => e.into(),
        }
    }

    /// Deliver an event without letting the sink affect the transition.
    async fn emit(&self, event: LifecycleEvent) {
        match tokio::time::timeout(self.event_timeout, self.events.emit(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                "Failed to deliver {} for {}: {}",
                event.kind,
                event.deployment_id,
                e
            ),
            Err(_) => tracing::warn!(
                "Timed out delivering {} for {} after {:?}",
                event.kind,
                event.deployment_id,
                self.event_timeout
            ),
        }
    }
}

/// Check that `transition` is a legal edge out of the row's status.
fn check(current: &Deployment, transition: Transition) -> Result<(), DeployError> {
    if transition == Transition::Rollback {
        let already_rolled_back = current.status == DeploymentStatus::RolledBack;
        let ineligible = current.status == DeploymentStatus::Success && !current.can_rollback;
        if already_rolled_back || ineligible {
            return Err(DeployError::RollbackNotPermitted { id: current.id });
        }
    }

    if !transition.allowed_from(current.status) {
        return Err(DeployError::IllegalTransition {
            id: current.id,
            from: current.status,
            transition,
        });
    }

    Ok(())
}

/// Whole seconds between start and completion; zero if the start is unknown.
fn elapsed_seconds(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    started_at
        .map(|started| (now - started).num_seconds().max(0) as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::OutcomeKind;
    use chrono::Duration as ChronoDuration;

    fn row(status: DeploymentStatus, can_rollback: bool) -> Deployment {
        let mut d = NewDeployment::new("api", "1.0.0")
            .into_pending(DeploymentId::generate(), Utc::now())
            .unwrap();
        d.status = status;
        d.can_rollback = can_rollback;
        d
    }

    #[test]
    fn elapsed_floors_to_whole_seconds() {
        let start = Utc::now();
        let end = start + ChronoDuration::milliseconds(45_900);
        assert_eq!(elapsed_seconds(Some(start), end), 45);
    }

    #[test]
    fn elapsed_without_start_is_zero() {
        assert_eq!(elapsed_seconds(None, Utc::now()), 0);
    }

    #[test]
    fn elapsed_never_negative() {
        let start = Utc::now();
        assert_eq!(elapsed_seconds(Some(start), start - ChronoDuration::seconds(5)), 0);
    }

    #[test]
    fn rollback_of_rolled_back_is_not_permitted() {
        let err = check(&row(DeploymentStatus::RolledBack, false), Transition::Rollback)
            .unwrap_err();
        assert!(matches!(err, DeployError::RollbackNotPermitted { .. }));
    }

    #[test]
    fn rollback_of_failed_is_illegal() {
        let err = check(&row(DeploymentStatus::Failed, true), Transition::Rollback).unwrap_err();
        assert!(matches!(err, DeployError::IllegalTransition { .. }));
    }

    #[test]
    fn complete_requires_in_progress() {
        let pending = row(DeploymentStatus::Pending, true);
        assert!(check(&pending, Transition::Complete(OutcomeKind::Success)).is_err());
        let running = row(DeploymentStatus::InProgress, true);
        assert!(check(&running, Transition::Complete(OutcomeKind::Failed)).is_ok());
    }
}
