// ABOUTME: Integration tests for quick deploy and quick rollback.
// ABOUTME: Quick rollback always demotes the live production row, never the target.

mod support;

use rollout::deploy::{DeployError, NewDeployment};
use rollout::events::EventKind;
use rollout::types::{DeploymentStatus, Environment};
use support::Harness;

fn prod(version: &str) -> NewDeployment {
    NewDeployment::new("api", version).environment(Environment::Production)
}

#[tokio::test]
async fn rolls_back_live_deployment_not_target() {
    let mut h = Harness::new();
    let old = h.succeeded(prod("1.0.0")).await;
    let live = h.succeeded(prod("1.1.0")).await;
    h.drain_events();

    let result = h.engine.quick_rollback("1.0.0").await.unwrap();

    assert_eq!(result.rolled_back.id, live.id);
    assert_eq!(result.rolled_back.status, DeploymentStatus::RolledBack);
    assert_eq!(result.target.id, old.id);

    // The target row is untouched.
    assert_eq!(h.engine.get(&old.id).await.unwrap(), old);

    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::RolledBack);
    assert_eq!(events[0].deployment_id, live.id);
    assert_eq!(events[0].target_version.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn promoted_deployment_counts_as_live() {
    let h = Harness::new();
    h.succeeded(prod("1.0.0")).await;
    let staged = h
        .succeeded(NewDeployment::new("api", "1.1.0").environment(Environment::Staging))
        .await;
    h.engine.promote(&staged.id).await.unwrap();

    let result = h.engine.quick_rollback("1.0.0").await.unwrap();
    assert_eq!(result.rolled_back.id, staged.id);
}

#[tokio::test]
async fn no_live_deployment() {
    let h = Harness::new();
    h.succeeded(NewDeployment::new("api", "1.0.0").environment(Environment::Staging))
        .await;

    let err = h.engine.quick_rollback("1.0.0").await.unwrap_err();
    assert!(matches!(err, DeployError::NoLiveDeployment));
}

#[tokio::test]
async fn unknown_version_has_no_target() {
    let h = Harness::new();
    h.succeeded(prod("1.0.0")).await;
    let live = h.succeeded(prod("1.1.0")).await;

    let err = h.engine.quick_rollback("0.9.0").await.unwrap_err();
    assert!(matches!(err, DeployError::NoRollbackTarget(ref v) if v == "0.9.0"));
    assert_eq!(
        h.engine.get(&live.id).await.unwrap().status,
        DeploymentStatus::Success
    );
}

#[tokio::test]
async fn live_row_is_not_its_own_target() {
    let h = Harness::new();
    h.succeeded(prod("1.1.0")).await;

    let err = h.engine.quick_rollback("1.1.0").await.unwrap_err();
    assert!(matches!(err, DeployError::NoRollbackTarget(_)));
}

#[tokio::test]
async fn failed_deployment_is_not_a_target() {
    let h = Harness::new();
    let failed = h.engine.create(prod("1.0.0")).await.unwrap();
    h.engine.start(&failed.id).await.unwrap();
    h.engine
        .complete(&failed.id, rollout::deploy::Outcome::failed("boom"))
        .await
        .unwrap();
    h.succeeded(prod("1.1.0")).await;

    let err = h.engine.quick_rollback("1.0.0").await.unwrap_err();
    assert!(matches!(err, DeployError::NoRollbackTarget(_)));
}

#[tokio::test]
async fn ineligible_live_deployment_is_not_permitted() {
    let h = Harness::new();
    h.succeeded(prod("1.0.0")).await;
    h.succeeded(prod("1.1.0").can_rollback(false)).await;

    let err = h.engine.quick_rollback("1.0.0").await.unwrap_err();
    assert!(matches!(err, DeployError::RollbackNotPermitted { .. }));
}
