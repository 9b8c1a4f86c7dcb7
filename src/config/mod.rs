// ABOUTME: Configuration types and parsing for rollout.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and environment overrides.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::{TEMPLATE, init_config};

use crate::error::{Error, Result};
use crate::events::{AuditLog, Fanout, TracingSink};
use crate::hooks::HookRunner;
use crate::store::FileStore;
use crate::types::Environment;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "rollout.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollout.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollout/config.yml";

/// Replaces `store.path` when set.
pub const STORE_ENV: &str = "ROLLOUT_STORE";
/// Replaces `events.audit_log` when set.
pub const AUDIT_LOG_ENV: &str = "ROLLOUT_AUDIT_LOG";

pub const DEFAULT_STORE_PATH: &str = ".rollout/deployments.json";
pub const DEFAULT_HOOKS_DIR: &str = ".rollout/hooks";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub events: EventsConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: EnvValue,

    #[serde(with = "humantime_serde")]
    pub lock_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub stale_lock_after: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: EnvValue::Literal(DEFAULT_STORE_PATH.to_string()),
            lock_timeout: Duration::from_secs(5),
            stale_lock_after: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    pub audit_log: Option<EnvValue>,

    pub hooks_dir: PathBuf,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            audit_log: None,
            hooks_dir: PathBuf::from(DEFAULT_HOOKS_DIR),
            timeout: crate::deploy::DEFAULT_EVENT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub environment: Environment,
    pub deploy_type: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            deploy_type: crate::deploy::DEFAULT_DEPLOY_TYPE.to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a config file in `dir`, falling back to defaults when there is none.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::load(path);
            }
        }

        tracing::debug!("No config file in {}, using defaults", dir.display());
        Ok(Self::default())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(STORE_ENV) {
            self.store.path = EnvValue::Literal(path);
        }
        if let Ok(path) = std::env::var(AUDIT_LOG_ENV) {
            self.events.audit_log = Some(EnvValue::Literal(path));
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        let path = self.store.path.resolve()?;
        if path.trim().is_empty() {
            return Err(Error::InvalidConfig("store.path is empty".to_string()));
        }
        Ok(PathBuf::from(path))
    }

    pub fn open_store(&self) -> Result<FileStore> {
        Ok(FileStore::new(self.store_path()?)
            .lock_timeout(self.store.lock_timeout)
            .stale_lock_after(self.store.stale_lock_after))
    }

    /// Event sinks described by the config: tracing, then audit log, then hooks.
    pub fn build_events(&self) -> Result<Fanout> {
        let mut sinks = Fanout::new().with(TracingSink);

        if let Some(ref audit_log) = self.events.audit_log {
            sinks = sinks.with(AuditLog::new(audit_log.resolve()?));
        }

        if self.events.hooks_dir.is_dir() {
            sinks = sinks.with(HookRunner::new(&self.events.hooks_dir));
        }

        Ok(sinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.store.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.events.hooks_dir, PathBuf::from(DEFAULT_HOOKS_DIR));
        assert_eq!(config.defaults.environment, Environment::Development);
        assert_eq!(config.defaults.deploy_type, "full");
    }

    #[test]
    fn parses_humantime_durations() {
        let config = Config::from_yaml(
            r#"
store:
  path: /var/lib/rollout/deployments.json
  lock_timeout: 2s
  stale_lock_after: 5m
events:
  timeout: 500ms
"#,
        )
        .unwrap();
        assert_eq!(config.store.lock_timeout, Duration::from_secs(2));
        assert_eq!(config.store.stale_lock_after, Duration::from_secs(300));
        assert_eq!(config.events.timeout, Duration::from_millis(500));
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/var/lib/rollout/deployments.json")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_yaml("stor:\n  path: x\n").is_err());
    }

    #[test]
    fn defaults_section_parses_environment() {
        let config = Config::from_yaml("defaults:\n  environment: staging\n").unwrap();
        assert_eq!(config.defaults.environment, Environment::Staging);
    }
}
