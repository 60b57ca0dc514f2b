//! Locates the asset bucket created by setup.
//!
//! Setup names buckets `<prefix>-<timestamp>-<random>`, so the configured
//! name is matched as a prefix.

use crate::{
    errors::{DeployError, DeployResult, SETUP_HINT},
    services::object_store::ObjectStore,
};
use tracing::{debug, instrument};

#[instrument(skip(store))]
pub async fn resolve_bucket(store: &dyn ObjectStore, prefix: &str) -> DeployResult<String> {
    let buckets = store.list_buckets().await?;
    match buckets.into_iter().find(|name| name.starts_with(prefix)) {
        Some(name) => {
            debug!(bucket = %name, "resolved bucket");
            Ok(name)
        }
        None => Err(DeployError::NoBucket {
            prefix: prefix.to_string(),
            hint: SETUP_HINT,
        }),
    }
}
