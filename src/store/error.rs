// ABOUTME: Record store error types with SNAFU pattern.
// ABOUTME: Separates transient outages from corruption for retry decisions.

use snafu::Snafu;
use std::path::PathBuf;

use crate::types::DeploymentId;

/// Failure reported by a record store backend.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("store unavailable: {message}"))]
    Unavailable { message: String },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("store file {} is corrupt: {source}", path.display()))]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to encode store contents: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("store lock {} unavailable: {message}", path.display()))]
    Lock { path: PathBuf, message: String },

    #[snafu(display("deployment {id} already exists"))]
    Duplicate { id: DeploymentId },

    #[snafu(display("store worker failed: {source}"))]
    Worker { source: tokio::task::JoinError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Backend could not be reached or did not answer.
    Unavailable,
    /// Filesystem I/O failed.
    Io,
    /// Persisted data could not be decoded or encoded.
    Corrupt,
    /// Another writer holds the store lock.
    Locked,
    /// Insert collided with an existing row.
    Duplicate,
}

impl StoreError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Unavailable { .. } | StoreError::Worker { .. } => {
                StoreErrorKind::Unavailable
            }
            StoreError::Read { .. } | StoreError::Write { .. } => StoreErrorKind::Io,
            StoreError::Corrupt { .. } | StoreError::Encode { .. } => StoreErrorKind::Corrupt,
            StoreError::Lock { .. } => StoreErrorKind::Locked,
            StoreError::Duplicate { .. } => StoreErrorKind::Duplicate,
        }
    }

    /// Nothing was observed or changed, so a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            StoreErrorKind::Unavailable | StoreErrorKind::Io | StoreErrorKind::Locked
        )
    }
}
