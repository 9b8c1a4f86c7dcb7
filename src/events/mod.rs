// ABOUTME: Lifecycle events emitted after a transition commits.
// ABOUTME: Sinks are best-effort; the engine logs and drops their failures.

mod audit;
mod sink;

pub use audit::AuditLog;
pub use sink::{ChannelSink, EventSink, Fanout, NullSink, SinkError, TracingSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::deploy::{Deployment, OutcomeKind};
use crate::types::{DeploymentId, DeploymentStatus, Environment};

/// What happened to a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "deployment.created")]
    Created,
    #[serde(rename = "deployment.started")]
    Started,
    #[serde(rename = "deployment.completed")]
    Completed,
    #[serde(rename = "deployment.cancelled")]
    Cancelled,
    #[serde(rename = "deployment.rolled_back")]
    RolledBack,
    #[serde(rename = "deployment.promoted")]
    Promoted,
    #[serde(rename = "deployment.deleted")]
    Deleted,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Created => "deployment.created",
            EventKind::Started => "deployment.started",
            EventKind::Completed => "deployment.completed",
            EventKind::Cancelled => "deployment.cancelled",
            EventKind::RolledBack => "deployment.rolled_back",
            EventKind::Promoted => "deployment.promoted",
            EventKind::Deleted => "deployment.deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A snapshot of a deployment at the moment a transition committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub deployment_id: DeploymentId,
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub status: DeploymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind, deployment: &Deployment, occurred_at: DateTime<Utc>) -> Self {
        let outcome = match (kind, deployment.status) {
            (EventKind::Completed, DeploymentStatus::Success) => Some(OutcomeKind::Success),
            (EventKind::Completed, DeploymentStatus::Failed) => Some(OutcomeKind::Failed),
            _ => None,
        };

        Self {
            kind,
            deployment_id: deployment.id,
            name: deployment.name.to_string(),
            version: deployment.version.to_string(),
            environment: deployment.environment,
            status: deployment.status,
            outcome,
            error_message: deployment.error_message.clone(),
            target_version: None,
            occurred_at,
        }
    }

    /// Attach the version a quick rollback was aimed at.
    pub fn with_target_version(mut self, version: impl Into<String>) -> Self {
        self.target_version = Some(version.into());
        self
    }
}
