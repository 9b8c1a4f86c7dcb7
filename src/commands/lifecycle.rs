// ABOUTME: Handlers for commands that create or move deployments.
// ABOUTME: Each maps onto a single engine operation and prints the resulting row.

use rollout::deploy::{NewDeployment, Outcome};
use rollout::error::Result;
use rollout::types::DeploymentId;

use super::Context;
use crate::cli::CreateArgs;

fn new_deployment(ctx: &Context<'_>, args: CreateArgs) -> NewDeployment {
    let defaults = &ctx.config.defaults;
    let mut spec = NewDeployment::new(args.name, args.version)
        .environment(args.env.unwrap_or(defaults.environment))
        .deploy_type(args.deploy_type.unwrap_or_else(|| defaults.deploy_type.clone()))
        .can_rollback(!args.no_rollback);

    spec.branch = args.branch;
    spec.commit_hash = args.commit;
    spec.commit_message = args.commit_message;
    spec.commit_author = args.author;
    spec.notes = args.notes;
    spec.tags = args.tags;
    spec
}

pub async fn create(ctx: &Context<'_>, args: CreateArgs) -> Result<()> {
    let spec = new_deployment(ctx, args);
    let deployment = ctx.engine.create(spec).await?;
    ctx.output.deployment("Created", &deployment);
    Ok(())
}

pub async fn quick_deploy(ctx: &Context<'_>, args: CreateArgs) -> Result<()> {
    let spec = new_deployment(ctx, args);
    let deployment = ctx.engine.quick_deploy(spec).await?;
    ctx.output.deployment("Created", &deployment);
    ctx.output
        .progress(&format!("Run `rollout start {}` to begin", deployment.id));
    Ok(())
}

pub async fn start(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let deployment = ctx.engine.start(&id).await?;
    ctx.output.deployment("Started", &deployment);
    Ok(())
}

pub async fn complete(
    ctx: &Context<'_>,
    id: DeploymentId,
    failed: bool,
    message: Option<String>,
) -> Result<()> {
    let outcome = if failed {
        Outcome::Failure(message)
    } else {
        Outcome::Success
    };
    let deployment = ctx.engine.complete(&id, outcome).await?;
    ctx.output.deployment("Completed", &deployment);
    Ok(())
}

pub async fn cancel(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let deployment = ctx.engine.cancel(&id).await?;
    ctx.output.deployment("Cancelled", &deployment);
    Ok(())
}

pub async fn rollback(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let deployment = ctx.engine.rollback(&id).await?;
    ctx.output.deployment("Rolled back", &deployment);
    Ok(())
}

pub async fn promote(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let promotion = ctx.engine.promote_reporting(&id).await?;
    if !promotion.changed() {
        ctx.output
            .warning(&format!("Deployment {id} is already in production"));
    }
    ctx.output.deployment("Promoted", promotion.deployment());
    Ok(())
}

pub async fn delete(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let deployment = ctx.engine.delete(&id).await?;
    ctx.output.deployment("Deleted", &deployment);
    Ok(())
}

pub async fn quick_rollback(ctx: &Context<'_>, version: &str) -> Result<()> {
    let result = ctx.engine.quick_rollback(version).await?;
    ctx.output.deployment("Rolled back", &result.rolled_back);
    ctx.output.progress(&format!(
        "Create a new deployment of {} {} to restore it",
        result.target.name, result.target.version
    ));
    Ok(())
}
