// ABOUTME: Typed failures returned by lifecycle operations.
// ABOUTME: Distinguishes bad input, wrong state, ineligibility, absence and store outages.

use crate::store::StoreError;
use crate::types::{DeploymentId, DeploymentStatus, LabelError};

use super::state::Transition;

/// Errors that can occur during deployment lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Creation input was missing or malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] LabelError),

    /// The transition is not an outgoing edge of the persisted status.
    #[error("cannot {transition} deployment {id}: status is {from}")]
    IllegalTransition {
        id: DeploymentId,
        from: DeploymentStatus,
        transition: Transition,
    },

    /// The deployment is not eligible for rollback.
    #[error("deployment {id} is not eligible for rollback")]
    RollbackNotPermitted { id: DeploymentId },

    /// No deployment with this id exists.
    #[error("deployment not found: {0}")]
    NotFound(DeploymentId),

    /// The record store failed or could not be reached.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Quick rollback found nothing live in production to demote.
    #[error("no successful production deployment to roll back")]
    NoLiveDeployment,

    /// Quick rollback found no earlier successful deployment of the version.
    #[error("no successful deployment of version {0} to roll back to")]
    NoRollbackTarget(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Validation,
    IllegalTransition,
    RollbackNotPermitted,
    NotFound,
    StoreUnavailable,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Validation(_) => DeployErrorKind::Validation,
            DeployError::IllegalTransition { .. } => DeployErrorKind::IllegalTransition,
            DeployError::RollbackNotPermitted { .. } => DeployErrorKind::RollbackNotPermitted,
            DeployError::NotFound(_)
            | DeployError::NoLiveDeployment
            | DeployError::NoRollbackTarget(_) => DeployErrorKind::NotFound,
            DeployError::StoreUnavailable(_) => DeployErrorKind::StoreUnavailable,
        }
    }

    /// Safe to retry with backoff: nothing was observed or changed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeployError::StoreUnavailable(source) => source.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn illegal_transition_names_state() {
        let err = DeployError::IllegalTransition {
            id: DeploymentId::generate(),
            from: DeploymentStatus::Cancelled,
            transition: Transition::Start,
        };
        assert!(err.to_string().contains("cannot start"));
        assert!(err.to_string().contains("cancelled"));
        assert_eq!(err.kind(), DeployErrorKind::IllegalTransition);
        assert!(!err.is_retryable());
    }

    #[test]
    fn validation_wraps_label_error() {
        let err: DeployError = LabelError::Empty { field: "version" }.into();
        assert_eq!(err.kind(), DeployErrorKind::Validation);
        assert_eq!(err.to_string(), "validation failed: version is required");
    }

    #[test]
    fn offline_store_is_retryable() {
        let err: DeployError = StoreError::Unavailable {
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(err.kind(), DeployErrorKind::StoreUnavailable);
        assert!(err.is_retryable());
    }
}
