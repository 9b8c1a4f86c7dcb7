// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented rollout.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub const TEMPLATE: &str = r#"# rollout configuration

store:
  # Deployment ledger shared by every rollout process on this host.
  # Accepts a literal path or { env: VAR, default: path }.
  path: .rollout/deployments.json
  lock_timeout: 5s
  stale_lock_after: 60s

events:
  # Append every lifecycle event as a JSON line.
  # audit_log: .rollout/events.jsonl
  # Executables named after events, e.g. deployment.rolled_back
  hooks_dir: .rollout/hooks
  timeout: 5s

defaults:
  environment: development
  deploy_type: full
"#;

/// Write the template into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;
    Ok(config_path)
}
