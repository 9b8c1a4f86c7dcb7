// ABOUTME: The deployment transition table.
// ABOUTME: Maps each caller-invoked transition to the statuses it may leave from.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::DeploymentStatus;

/// Message recorded when a failure outcome carries no explanation.
pub const DEFAULT_FAILURE_MESSAGE: &str = "deployment failed";

/// Result reported by the caller when a running deployment finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(Option<String>),
}

impl Outcome {
    /// Failure outcome with an explanation.
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failure(Some(message.into()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success => OutcomeKind::Success,
            Outcome::Failure(_) => OutcomeKind::Failed,
        }
    }

    /// Error message to persist, if any.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(message) => Some(
                message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                    .to_string(),
            ),
        }
    }
}

/// Serializable outcome tag carried on completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failed,
}

impl OutcomeKind {
    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Start,
    Complete(OutcomeKind),
    Cancel,
    Rollback,
    Promote,
}

impl Transition {
    /// Every transition, with both completion outcomes.
    pub const ALL: [Transition; 6] = [
        Transition::Start,
        Transition::Complete(OutcomeKind::Success),
        Transition::Complete(OutcomeKind::Failed),
        Transition::Cancel,
        Transition::Rollback,
        Transition::Promote,
    ];

    /// Statuses this transition may be applied from.
    pub fn sources(&self) -> &'static [DeploymentStatus] {
        use DeploymentStatus::*;
        match self {
            Transition::Start => &[Pending],
            Transition::Complete(_) => &[InProgress],
            Transition::Cancel => &[Pending, InProgress],
            Transition::Rollback | Transition::Promote => &[Success],
        }
    }

    /// Status the row holds after the transition.
    pub fn target(&self) -> DeploymentStatus {
        use DeploymentStatus::*;
        match self {
            Transition::Start => InProgress,
            Transition::Complete(OutcomeKind::Success) => Success,
            Transition::Complete(OutcomeKind::Failed) => Failed,
            Transition::Cancel => Cancelled,
            Transition::Rollback => RolledBack,
            Transition::Promote => Success,
        }
    }

    pub fn allowed_from(&self, status: DeploymentStatus) -> bool {
        self.sources().contains(&status)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Complete(_) => "complete",
            Transition::Cancel => "cancel",
            Transition::Rollback => "rollback",
            Transition::Promote => "promote",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Follow `transition` from `status`, if the edge exists.
pub fn next_status(status: DeploymentStatus, transition: Transition) -> Option<DeploymentStatus> {
    transition
        .allowed_from(status)
        .then(|| transition.target())
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeploymentStatus::*;

    #[test]
    fn forward_edges() {
        assert_eq!(next_status(Pending, Transition::Start), Some(InProgress));
        assert_eq!(
            next_status(InProgress, Transition::Complete(OutcomeKind::Success)),
            Some(Success)
        );
        assert_eq!(
            next_status(InProgress, Transition::Complete(OutcomeKind::Failed)),
            Some(Failed)
        );
        assert_eq!(next_status(Success, Transition::Rollback), Some(RolledBack));
    }

    #[test]
    fn cancel_only_before_completion() {
        assert_eq!(next_status(Pending, Transition::Cancel), Some(Cancelled));
        assert_eq!(next_status(InProgress, Transition::Cancel), Some(Cancelled));
        assert_eq!(next_status(Success, Transition::Cancel), None);
    }

    #[test]
    fn promote_keeps_status() {
        assert_eq!(next_status(Success, Transition::Promote), Some(Success));
        assert_eq!(next_status(Pending, Transition::Promote), None);
    }

    #[test]
    fn absorbing_statuses_have_no_edges() {
        for status in [Failed, RolledBack, Cancelled] {
            for transition in Transition::ALL {
                assert_eq!(next_status(status, transition), None, "{status} --{transition}");
            }
        }
    }

    #[test]
    fn failure_message_defaults() {
        assert_eq!(
            Outcome::Failure(None).error_message().as_deref(),
            Some(DEFAULT_FAILURE_MESSAGE)
        );
        assert_eq!(
            Outcome::failed("  ").error_message().as_deref(),
            Some(DEFAULT_FAILURE_MESSAGE)
        );
        assert_eq!(
            Outcome::failed("build failed").error_message().as_deref(),
            Some("build failed")
        );
        assert_eq!(Outcome::Success.error_message(), None);
    }

    #[test]
    fn transitions_are_distinct_set_members() {
        let set: std::collections::HashSet<Transition> = Transition::ALL.into_iter().collect();
        assert_eq!(set.len(), Transition::ALL.len());
        assert!(set.contains(&Transition::Complete(OutcomeKind::Failed)));
    }

    #[test]
    fn outcome_names_match_serialized_form() {
        for kind in [OutcomeKind::Success, OutcomeKind::Failed] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
