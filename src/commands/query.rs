// ABOUTME: Read-only commands over the deployment ledger.
// ABOUTME: Show, list with filters, and aggregate stats.

use rollout::deploy::DeploymentFilter;
use rollout::error::Result;
use rollout::types::{DeploymentId, DeploymentStatus, Environment};

use super::Context;

pub async fn show(ctx: &Context<'_>, id: DeploymentId) -> Result<()> {
    let deployment = ctx.engine.get(&id).await?;
    ctx.output.deployment("Deployment", &deployment);
    Ok(())
}

pub async fn list(
    ctx: &Context<'_>,
    environment: Option<Environment>,
    status: Option<DeploymentStatus>,
    search: Option<String>,
) -> Result<()> {
    let filter = DeploymentFilter {
        environment,
        status,
        search,
    };
    let deployments = ctx.engine.list(&filter).await?;
    ctx.output.deployments(&deployments);
    Ok(())
}

pub async fn stats(ctx: &Context<'_>) -> Result<()> {
    let stats = ctx.engine.stats().await?;
    ctx.output.stats(&stats);
    Ok(())
}
