//! `clean`: remove versions outside the retention window.

use crate::{
    commands::CommandContext,
    errors::DeployResult,
    services::retention_service::{CleanReport, clean_old_versions},
};
use tracing::info;

pub async fn run(ctx: &mut CommandContext<'_>) -> DeployResult<CleanReport> {
    info!("=> Removing old files from CloudFront");

    let cfg = ctx.config;
    let bucket = ctx.bucket().await?;
    let report = clean_old_versions(ctx.store, &bucket, &cfg.app_name, cfg.old_versions).await?;

    // Only worth saying when clean was asked for directly.
    if report.removed_versions.is_empty() {
        if ctx.is_first_command() {
            info!("  No old files to remove");
        }
    } else {
        info!(
            versions = report.removed_versions.len(),
            files = report.deleted_keys,
            batches = report.batches,
            "  Old versions removed"
        );
    }
    Ok(report)
}
