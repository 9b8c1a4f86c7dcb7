// ABOUTME: Hook scripts run in response to deployment lifecycle events.
// ABOUTME: Discovers executables named after events and passes context via env vars.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::events::{EventKind, EventSink, LifecycleEvent, SinkError};

/// Context passed to hooks via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    pub event: &'a LifecycleEvent,
}

impl HookContext<'_> {
    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let event = self.event;
        let mut env = HashMap::new();
        env.insert("ROLLOUT_EVENT".to_string(), event.kind.name().to_string());
        env.insert(
            "ROLLOUT_DEPLOYMENT_ID".to_string(),
            event.deployment_id.to_string(),
        );
        env.insert("ROLLOUT_NAME".to_string(), event.name.clone());
        env.insert("ROLLOUT_VERSION".to_string(), event.version.clone());
        env.insert(
            "ROLLOUT_ENVIRONMENT".to_string(),
            event.environment.to_string(),
        );
        env.insert("ROLLOUT_STATUS".to_string(), event.status.to_string());
        env.insert(
            "ROLLOUT_OCCURRED_AT".to_string(),
            event.occurred_at.to_rfc3339(),
        );
        if let Some(outcome) = event.outcome {
            env.insert("ROLLOUT_OUTCOME".to_string(), outcome.as_str().to_string());
        }
        if let Some(ref message) = event.error_message {
            env.insert("ROLLOUT_ERROR_MESSAGE".to_string(), message.clone());
        }
        if let Some(ref target) = event.target_version {
            env.insert("ROLLOUT_TARGET_VERSION".to_string(), target.clone());
        }
        env
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Discovers and runs hooks from a hooks directory.
///
/// A hook for an event is an executable file named after the event, for
/// example `deployment.rolled_back`.
#[derive(Debug, Clone)]
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    /// Create a hook runner looking for hooks in `hooks_dir`.
    pub fn new(hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
        }
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    /// Check if a hook exists for the given event.
    pub fn hook_exists(&self, kind: EventKind) -> bool {
        self.hook_path(kind).is_file()
    }

    /// Get the path to a hook script.
    fn hook_path(&self, kind: EventKind) -> PathBuf {
        self.hooks_dir.join(kind.name())
    }

    /// Run the hook for an event if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    pub async fn run(&self, event: &LifecycleEvent) -> Option<HookResult> {
        let hook_path = self.hook_path(event.kind);

        if !hook_path.is_file() {
            return None;
        }

        tracing::info!("Running {} hook: {}", event.kind, hook_path.display());

        let env_vars = HookContext { event }.to_env();

        let output = Command::new(&hook_path)
            .envs(&env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = HookResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if result.success {
                    tracing::info!("{} hook completed successfully", event.kind);
                } else {
                    tracing::warn!(
                        "{} hook failed with exit code {:?}",
                        event.kind,
                        result.exit_code
                    );
                }

                Some(result)
            }
            Err(e) => {
                tracing::error!("Failed to execute {} hook: {}", event.kind, e);
                Some(HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl EventSink for HookRunner {
    async fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        match self.run(event).await {
            Some(result) if !result.success => Err(SinkError::Hook {
                hook: event.kind.name().to_string(),
                exit_code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            }),
            _ => Ok(()),
        }
    }
}
