// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use rollout::types::{DeploymentId, DeploymentStatus, Environment};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Deployment lifecycle ledger with safe, concurrent state transitions")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only ids and final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (default: discover rollout.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollout.yml configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Record a new pending deployment
    Create(CreateArgs),

    /// Record a new pending deployment with minimal input
    QuickDeploy(CreateArgs),

    /// Mark a pending deployment as in progress
    Start { id: DeploymentId },

    /// Record the outcome of an in-progress deployment
    Complete {
        id: DeploymentId,

        /// Record a failure instead of success
        #[arg(long)]
        failed: bool,

        /// Failure explanation
        #[arg(short, long, requires = "failed")]
        message: Option<String>,
    },

    /// Cancel a pending or in-progress deployment
    Cancel { id: DeploymentId },

    /// Roll back a successful deployment
    Rollback { id: DeploymentId },

    /// Move a successful deployment to production
    Promote { id: DeploymentId },

    /// Delete a deployment record
    Delete { id: DeploymentId },

    /// Roll back the live production deployment in favour of an earlier version
    QuickRollback { version: String },

    /// Show a single deployment
    Show { id: DeploymentId },

    /// List deployments, newest first
    List {
        #[arg(short, long)]
        env: Option<Environment>,

        #[arg(short, long)]
        status: Option<DeploymentStatus>,

        /// Case-insensitive match on name, version, branch, or commit message
        #[arg(long)]
        search: Option<String>,
    },

    /// Show aggregate deployment statistics
    Stats,
}

#[derive(Args)]
pub struct CreateArgs {
    pub name: String,

    pub version: String,

    #[arg(short, long)]
    pub env: Option<Environment>,

    #[arg(short, long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub commit: Option<String>,

    #[arg(long)]
    pub commit_message: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    /// Deploy type (default from config, normally "full")
    #[arg(long = "type")]
    pub deploy_type: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Mark the deployment as not eligible for rollback
    #[arg(long)]
    pub no_rollback: bool,
}
