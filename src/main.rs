// ABOUTME: Entry point for the rollout CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rollout::config::{self, Config};
use rollout::error::Result;
use rollout::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        let path = config::init_config(&cwd, force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(());
    }

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::discover_or_default(&cwd)?,
    };
    config.apply_env_overrides();

    let ctx = commands::Context::open(config, output)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Create(args) => commands::create(&ctx, args).await,
        Commands::QuickDeploy(args) => commands::quick_deploy(&ctx, args).await,
        Commands::Start { id } => commands::start(&ctx, id).await,
        Commands::Complete {
            id,
            failed,
            message,
        } => commands::complete(&ctx, id, failed, message).await,
        Commands::Cancel { id } => commands::cancel(&ctx, id).await,
        Commands::Rollback { id } => commands::rollback(&ctx, id).await,
        Commands::Promote { id } => commands::promote(&ctx, id).await,
        Commands::Delete { id } => commands::delete(&ctx, id).await,
        Commands::QuickRollback { version } => commands::quick_rollback(&ctx, &version).await,
        Commands::Show { id } => commands::show(&ctx, id).await,
        Commands::List {
            env,
            status,
            search,
        } => commands::list(&ctx, env, status, search).await,
        Commands::Stats => commands::stats(&ctx).await,
    }
}
