// ABOUTME: Opaque deployment identifier backed by a random UUID.
// ABOUTME: Assigned once at creation and never changed afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("invalid deployment id '{input}': {source}")]
pub struct ParseIdError {
    input: String,
    #[source]
    source: uuid::Error,
}

/// Identifier of a single deployment row.
#[must_use = "IDs reference deployments and should not be ignored"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentId(Uuid);

impl DeploymentId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, ParseIdError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|source| ParseIdError {
                input: value.to_string(),
                source,
            })
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeploymentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DeploymentId::generate(), DeploymentId::generate());
    }

    #[test]
    fn parse_accepts_display_output() {
        let id = DeploymentId::generate();
        let parsed: DeploymentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = DeploymentId::parse("not-an-id").unwrap_err();
        assert!(err.to_string().contains("not-an-id"));
    }
}
