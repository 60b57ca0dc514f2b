//! Finds the CloudFront distribution serving an app out of its bucket.

use crate::{
    errors::{DeployError, DeployResult, SETUP_HINT},
    services::cdn::CdnDirectory,
};
use tracing::{debug, instrument};

/// Public domain of the distribution whose origin is `bucket` scoped to
/// `/<app_name>`. Never creates a distribution.
#[instrument(skip(cdn))]
pub async fn distribution_domain(
    cdn: &dyn CdnDirectory,
    bucket: &str,
    app_name: &str,
) -> DeployResult<String> {
    let distributions = cdn.list_distributions().await?;
    match distributions.iter().find(|d| d.serves(bucket, app_name)) {
        Some(distribution) => {
            debug!(domain = %distribution.domain_name, "found distribution");
            Ok(distribution.domain_name.clone())
        }
        None => Err(DeployError::NoDistribution { hint: SETUP_HINT }),
    }
}

/// `https://<domain>`, the value exported as `CDN_URL`.
pub async fn cdn_url(
    cdn: &dyn CdnDirectory,
    bucket: &str,
    app_name: &str,
) -> DeployResult<String> {
    let domain = distribution_domain(cdn, bucket, app_name).await?;
    Ok(format!("https://{domain}"))
}
