//! `env`: resolve the CDN URL the deployed app should load assets from.

use crate::{
    commands::CommandContext, errors::DeployResult, services::distribution_service::cdn_url,
};
use tracing::info;

pub async fn run(ctx: &mut CommandContext<'_>) -> DeployResult<String> {
    let bucket = ctx.bucket().await?;
    let url = cdn_url(ctx.cdn, &bucket, &ctx.config.app_name).await?;
    info!(%url, "  CDN_URL resolved");
    println!("CDN_URL={url}");
    Ok(url)
}
