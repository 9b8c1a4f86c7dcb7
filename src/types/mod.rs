// ABOUTME: Identifiers and validated value types for deployment rows.
// ABOUTME: Parsing happens at the edges so the engine only sees valid values.

mod environment;
mod id;
mod label;
mod status;

pub use environment::{Environment, ParseEnvironmentError};
pub use id::{DeploymentId, ParseIdError};
pub use label::{Label, LabelError, MAX_LABEL_LEN};
pub use status::{DeploymentStatus, ParseStatusError};
