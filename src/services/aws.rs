//! Per-invocation AWS client construction.

use crate::{
    config::AwsSettings,
    services::{cdn::CloudFrontDirectory, object_store::S3ObjectStore},
};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

/// Clients for one command run, built from explicit settings rather than any
/// shared SDK state.
pub struct AwsClients {
    pub s3: S3ObjectStore,
    pub cloudfront: CloudFrontDirectory,
}

impl AwsClients {
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let sdk_config = load_sdk_config(settings).await;
        Self {
            s3: S3ObjectStore::new(aws_sdk_s3::Client::new(&sdk_config)),
            cloudfront: CloudFrontDirectory::new(aws_sdk_cloudfront::Client::new(&sdk_config)),
        }
    }
}

async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()));

    // Explicit keys win; otherwise the ambient credential chain applies.
    if let Some(creds) = &settings.credentials {
        loader = loader.credentials_provider(Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            None,
            None,
            "cdn-assets-config",
        ));
    }

    loader.load().await
}
