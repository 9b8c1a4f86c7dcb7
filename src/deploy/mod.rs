// ABOUTME: Deployment lifecycle: records, the transition graph, and the engine that drives it.
// ABOUTME: Exports the engine plus the value types callers pass in and get back.

mod deployment;
mod engine;
mod error;
mod filter;
mod quick;
mod state;
mod stats;

pub use deployment::{DEFAULT_DEPLOY_TYPE, Deployment, NewDeployment};
pub use engine::{DEFAULT_EVENT_TIMEOUT, Engine, Promotion};
pub use error::{DeployError, DeployErrorKind};
pub use filter::DeploymentFilter;
pub use quick::QuickRollback;
pub use state::{DEFAULT_FAILURE_MESSAGE, Outcome, OutcomeKind, Transition, next_status};
pub use stats::DeploymentStats;
