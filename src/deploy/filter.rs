// ABOUTME: Read-side filtering for deployment listings.
// ABOUTME: Environment, status, and case-insensitive text search.

use crate::types::{DeploymentStatus, Environment};

use super::Deployment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentFilter {
    pub environment: Option<Environment>,
    pub status: Option<DeploymentStatus>,
    /// Matched against name, version, branch and commit message.
    pub search: Option<String>,
}

impl DeploymentFilter {
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn status(mut self, status: DeploymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn matches(&self, deployment: &Deployment) -> bool {
        if self
            .environment
            .is_some_and(|env| deployment.environment != env)
        {
            return false;
        }

        if self.status.is_some_and(|status| deployment.status != status) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                [
                    Some(deployment.name.as_str()),
                    Some(deployment.version.as_str()),
                    deployment.branch.as_deref(),
                    deployment.commit_message.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&query))
            }
        }
    }
}
