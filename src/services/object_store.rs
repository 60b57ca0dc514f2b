//! Object storage seam.
//!
//! The deploy core only needs four calls: list buckets, one delimiter-scoped
//! listing page, a batch delete, and a streamed upload. `S3ObjectStore` talks
//! to S3; tests substitute an in-memory store.

use crate::{
    errors::{DeployError, DeployResult},
    models::listing::ListingPage,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{Delete, ObjectIdentifier},
};
use std::path::Path;
use tracing::{debug, instrument};

/// S3 rejects `DeleteObjects` requests with more keys than this.
pub const MAX_DELETE_BATCH: usize = 500;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> DeployResult<Vec<String>>;

    /// One page of the listing of `prefix`, grouped by `delimiter`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> DeployResult<ListingPage>;

    /// Delete up to `MAX_DELETE_BATCH` keys in one request.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> DeployResult<()>;

    /// Stream a local file to `key`.
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> DeployResult<()>;
}

/// List one hierarchy level completely, following continuation tokens.
pub async fn list_level(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> DeployResult<ListingPage> {
    let mut level = ListingPage::default();
    let mut continuation_token: Option<String> = None;

    loop {
        let page = store
            .list_objects(bucket, prefix, "/", continuation_token.take())
            .await?;
        level.keys.extend(page.keys);
        level.common_prefixes.extend(page.common_prefixes);

        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    Ok(level)
}

fn storage_error<E>(op: &'static str) -> impl FnOnce(E) -> DeployError
where
    E: std::error::Error,
{
    move |err| DeployError::Storage(format!("{op}: {}", DisplayErrorContext(&err)))
}

/// `ObjectStore` backed by the AWS S3 SDK.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn list_buckets(&self) -> DeployResult<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(storage_error("S3 ListBuckets"))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    #[instrument(skip(self, continuation_token), fields(%bucket, %prefix))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> DeployResult<ListingPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(storage_error("S3 ListObjectsV2"))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();
        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(str::to_string))
            .collect();
        let next_continuation_token = if output.is_truncated() == Some(true) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListingPage {
            keys,
            common_prefixes,
            next_continuation_token,
        })
    }

    #[instrument(skip(self, keys), fields(%bucket, count = keys.len()))]
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> DeployResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        if keys.len() > MAX_DELETE_BATCH {
            return Err(DeployError::InvalidBatch(keys.len()));
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error("build DeleteObjects request"))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(storage_error("build DeleteObjects request"))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(storage_error("S3 DeleteObjects"))?;

        // A 200 response can still carry per-key failures.
        if let Some(first) = output.errors().first() {
            return Err(DeployError::Storage(format!(
                "S3 DeleteObjects: {} of {} keys failed, first `{}`: {}",
                output.errors().len(),
                keys.len(),
                first.key().unwrap_or_default(),
                first.message().unwrap_or("unknown error"),
            )));
        }

        debug!("batch deleted");
        Ok(())
    }

    #[instrument(skip(self, source), fields(%bucket, %key))]
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> DeployResult<()> {
        let body = ByteStream::from_path(source).await.map_err(|err| {
            DeployError::Storage(format!(
                "open file for upload {}: {}",
                source.display(),
                DisplayErrorContext(&err)
            ))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(storage_error("S3 PutObject"))?;

        debug!(path = %source.display(), "object uploaded");
        Ok(())
    }
}
