//! CDN directory seam; read-only access to CloudFront distributions.

use crate::{
    errors::{DeployError, DeployResult},
    models::distribution::{Distribution, Origin},
};
use async_trait::async_trait;
use aws_sdk_cloudfront::{Client, error::DisplayErrorContext};
use tracing::{debug, instrument};

#[async_trait]
pub trait CdnDirectory: Send + Sync {
    /// Every distribution in the account.
    async fn list_distributions(&self) -> DeployResult<Vec<Distribution>>;
}

#[derive(Clone, Debug)]
pub struct CloudFrontDirectory {
    client: Client,
}

impl CloudFrontDirectory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CdnDirectory for CloudFrontDirectory {
    #[instrument(skip(self))]
    async fn list_distributions(&self) -> DeployResult<Vec<Distribution>> {
        let mut distributions = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_distributions()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|err| {
                    DeployError::Cdn(format!(
                        "CloudFront ListDistributions: {}",
                        DisplayErrorContext(&err)
                    ))
                })?;

            let Some(list) = output.distribution_list() else {
                break;
            };

            for summary in list.items() {
                let origins = summary
                    .origins()
                    .map(|origins| origins.items())
                    .unwrap_or_default()
                    .iter()
                    .map(|origin| Origin {
                        id: origin.id().to_string(),
                        origin_path: origin.origin_path().unwrap_or_default().to_string(),
                    })
                    .collect();
                distributions.push(Distribution {
                    domain_name: summary.domain_name().to_string(),
                    origins,
                });
            }

            match list.next_marker() {
                Some(next) if list.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = distributions.len(), "listed distributions");
        Ok(distributions)
    }
}
