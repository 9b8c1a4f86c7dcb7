// ABOUTME: The deployment row and the input used to create one.
// ABOUTME: Descriptive fields are fixed at creation; lifecycle fields move via the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DeploymentId, DeploymentStatus, Environment, Label, LabelError};

use super::state::{OutcomeKind, Transition};

/// Deploy type recorded when the caller does not name one.
pub const DEFAULT_DEPLOY_TYPE: &str = "full";

/// A single attempt to ship a named, versioned artifact to an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub name: Label,
    pub version: Label,
    pub environment: Environment,
    pub status: DeploymentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_author: Option<String>,
    pub deploy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub can_rollback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// Currently serving production traffic.
    pub fn is_live(&self) -> bool {
        self.status == DeploymentStatus::Success && self.environment.is_production()
    }

    /// Caller-visible actions that are legal for this row as persisted.
    ///
    /// Promotion is omitted once the row is already in production, even though
    /// promoting again would succeed as a no-op.
    pub fn available_transitions(&self) -> Vec<Transition> {
        Transition::ALL
            .into_iter()
            .filter(|t| t.allowed_from(self.status))
            .filter(|t| match t {
                Transition::Rollback => self.can_rollback,
                Transition::Promote => !self.environment.is_production(),
                _ => true,
            })
            .collect()
    }

    /// Shorthand for `Transition::Complete` regardless of outcome.
    pub fn can_complete(&self) -> bool {
        Transition::Complete(OutcomeKind::Success).allowed_from(self.status)
    }
}

/// Input for creating a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeployment {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub commit_author: Option<String>,
    #[serde(default)]
    pub deploy_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_can_rollback")]
    pub can_rollback: bool,
}

fn default_can_rollback() -> bool {
    true
}

impl NewDeployment {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            can_rollback: true,
            ..Default::default()
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn commit(mut self, hash: impl Into<String>, message: impl Into<String>) -> Self {
        self.commit_hash = Some(hash.into());
        self.commit_message = Some(message.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.commit_author = Some(author.into());
        self
    }

    pub fn deploy_type(mut self, deploy_type: impl Into<String>) -> Self {
        self.deploy_type = Some(deploy_type.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn can_rollback(mut self, allowed: bool) -> Self {
        self.can_rollback = allowed;
        self
    }

    /// Validate the input and build the initial `pending` row.
    pub(crate) fn into_pending(
        self,
        id: DeploymentId,
        now: DateTime<Utc>,
    ) -> Result<Deployment, LabelError> {
        let name = Label::new("name", &self.name)?;
        let version = Label::new("version", &self.version)?;

        Ok(Deployment {
            id,
            name,
            version,
            environment: self.environment,
            status: DeploymentStatus::Pending,
            branch: non_blank(self.branch),
            commit_hash: non_blank(self.commit_hash),
            commit_message: non_blank(self.commit_message),
            commit_author: non_blank(self.commit_author),
            deploy_type: non_blank(self.deploy_type)
                .unwrap_or_else(|| DEFAULT_DEPLOY_TYPE.to_string()),
            notes: non_blank(self.notes),
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            started_at: None,
            completed_at: None,
            duration_seconds: 0,
            can_rollback: self.can_rollback,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }
}

// Optional form fields arrive as empty strings more often than as absent values.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
