// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;

use crate::deploy::{Deployment, DeploymentStats};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only ids and final results)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => print_json(&JsonEvent {
                event: "success",
                message,
            }),
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(&JsonEvent {
                    event: "warning",
                    message,
                }) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(&JsonEvent {
                    event: "error",
                    message,
                }) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a single deployment after an operation.
    pub fn deployment(&self, action: &str, deployment: &Deployment) {
        match self.mode {
            OutputMode::Normal => {
                println!("{action} {}", summary_line(deployment));
                for line in detail_lines(deployment) {
                    println!("  {line}");
                }
            }
            OutputMode::Quiet => println!("{}", deployment.id),
            OutputMode::Json => print_json(deployment),
        }
    }

    /// Print a listing, one deployment per line.
    pub fn deployments(&self, deployments: &[Deployment]) {
        match self.mode {
            OutputMode::Normal => {
                if deployments.is_empty() {
                    println!("No deployments");
                }
                for d in deployments {
                    println!("{}", summary_line(d));
                }
            }
            OutputMode::Quiet => {
                for d in deployments {
                    println!("{}", d.id);
                }
            }
            OutputMode::Json => {
                for d in deployments {
                    print_json(d);
                }
            }
        }
    }

    pub fn stats(&self, stats: &DeploymentStats) {
        match self.mode {
            OutputMode::Normal => {
                println!("Total:        {}", stats.total);
                println!("Successful:   {}", stats.successful);
                println!("Failed:       {}", stats.failed);
                println!("In progress:  {}", stats.in_progress);
                println!("Pending:      {}", stats.pending);
                println!("Rolled back:  {}", stats.rolled_back);
                println!("Cancelled:    {}", stats.cancelled);
                println!("Success rate: {:.1}%", stats.success_rate);
                println!(
                    "Avg duration: {}",
                    format_duration(stats.average_duration_seconds.round() as u64)
                );
                println!("This week:    {}", stats.created_this_week);
                println!("Today:        {}", stats.created_today);
            }
            OutputMode::Quiet => println!("{}", stats.total),
            OutputMode::Json => print_json(stats),
        }
    }
}

/// Render whole seconds as `1m 5s` or `45s`.
pub fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn summary_line(d: &Deployment) -> String {
    format!(
        "{} {} {} [{}] {}",
        d.id, d.name, d.version, d.environment, d.status
    )
}

fn detail_lines(d: &Deployment) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(ref branch) = d.branch {
        lines.push(format!("branch:   {branch}"));
    }
    if let Some(ref hash) = d.commit_hash {
        let message = d.commit_message.as_deref().unwrap_or("");
        lines.push(format!("commit:   {hash} {message}").trim_end().to_string());
    }
    lines.push(format!("type:     {}", d.deploy_type));
    if d.completed_at.is_some() {
        lines.push(format!("duration: {}", format_duration(d.duration_seconds)));
    }
    if let Some(ref message) = d.error_message {
        lines.push(format!("error:    {message}"));
    }
    let actions: Vec<&str> = d
        .available_transitions()
        .iter()
        .map(|t| t.name())
        .collect();
    if !actions.is_empty() {
        lines.push(format!("next:     {}", actions.join(", ")));
    }
    lines
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(65), "1m 5s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(3600), "60m 0s");
    }
}
