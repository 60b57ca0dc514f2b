//! `upload`: push the current build's public files under a new version.

use crate::{
    commands::CommandContext,
    errors::{DeployError, DeployResult},
    models::version::Version,
    services::{
        bundle_service::inject_version,
        manifest_service::{discover_architectures, merge_manifests},
        upload_service::{plan_uploads, upload_all},
    },
};
use tracing::{error, info};

pub async fn run(ctx: &mut CommandContext<'_>) -> DeployResult<Version> {
    info!("=> Uploading public files for CloudFront");

    let cfg = ctx.config;
    let build_location = cfg.build_location()?;
    let programs_dir = cfg.programs_dir()?;
    let bucket = ctx.bucket().await?;

    let version = Version::now();
    let archs = discover_architectures(&programs_dir).await?;
    let files = merge_manifests(&archs);
    let jobs = plan_uploads(&files, &version.key_prefix(&cfg.app_name), &programs_dir);
    info!(
        %version,
        %bucket,
        "  Uploading {} files from {} architectures",
        jobs.len(),
        archs.len()
    );

    let report = upload_all(ctx.store, &bucket, jobs, cfg.upload_concurrency).await;
    if !report.is_complete() {
        for failed in &report.failed {
            error!(key = %failed.key, error = %failed.error, "  Failed to upload");
        }
        return Err(DeployError::UploadFailed {
            failed: report.failed.len(),
            total: report.total,
        });
    }

    inject_version(build_location, version).await?;
    info!(%version, "  Uploaded version {version}");
    Ok(version)
}
