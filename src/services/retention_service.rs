//! Retention: find versions beyond the keep window and delete everything
//! stored under them.
//!
//! The store only lists one hierarchy level per call, so each old version is
//! walked with an explicit worklist of prefixes until no nested prefix is
//! left. Keys are then deleted in sequential batches of `DELETE_CHUNK_SIZE`.

use crate::{
    errors::DeployResult,
    models::version::Version,
    services::object_store::{MAX_DELETE_BATCH, ObjectStore, list_level},
};
use tracing::{debug, info, instrument, warn};

pub const DELETE_CHUNK_SIZE: usize = MAX_DELETE_BATCH;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_versions: Vec<Version>,
    pub deleted_keys: usize,
    pub batches: usize,
}

/// A version together with the exact prefix the store listed it under.
///
/// `todos/0100/` and `todos/100/` rank as the same version but hold
/// different keys, so deletion walks the listed prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoredVersion {
    pub version: Version,
    pub prefix: String,
}

/// Versions outside the `keep` most recent ones, newest first.
/// The newest version is never eligible, whatever `keep` says.
pub fn eligible_versions<T: Ord>(mut versions: Vec<T>, keep: usize) -> Vec<T> {
    versions.sort_unstable_by(|a, b| b.cmp(a));
    versions.dedup();
    versions.into_iter().skip(keep.max(1)).collect()
}

/// Split `keys` into delete batches of at most `size` keys.
pub fn chunk_keys(keys: &[String], size: usize) -> Vec<&[String]> {
    keys.chunks(size.max(1)).collect()
}

/// Versions currently stored under `app_name/`.
#[instrument(skip(store))]
pub async fn list_versions(
    store: &dyn ObjectStore,
    bucket: &str,
    app_name: &str,
) -> DeployResult<Vec<StoredVersion>> {
    let level = list_level(store, bucket, &format!("{app_name}/")).await?;
    let mut versions = Vec::with_capacity(level.common_prefixes.len());
    for prefix in level.common_prefixes {
        match Version::from_prefix(app_name, &prefix) {
            Some(version) => versions.push(StoredVersion { version, prefix }),
            None => warn!(%prefix, "ignoring prefix that is not a version"),
        }
    }
    Ok(versions)
}

/// Every object key below `root`, at any depth.
#[instrument(skip(store))]
pub async fn collect_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    root: &str,
) -> DeployResult<Vec<String>> {
    let mut keys = Vec::new();
    let mut pending = vec![root.to_string()];

    while let Some(prefix) = pending.pop() {
        let level = list_level(store, bucket, &prefix).await?;
        debug!(
            %prefix,
            keys = level.keys.len(),
            nested = level.common_prefixes.len(),
            "listed level"
        );
        keys.extend(level.keys);
        // Reverse so nested prefixes are walked in listing order.
        pending.extend(level.common_prefixes.into_iter().rev());
    }

    Ok(keys)
}

/// Delete all versions of `app_name` except the `keep` newest.
#[instrument(skip(store))]
pub async fn clean_old_versions(
    store: &dyn ObjectStore,
    bucket: &str,
    app_name: &str,
    keep: usize,
) -> DeployResult<CleanReport> {
    let old_versions = eligible_versions(list_versions(store, bucket, app_name).await?, keep);
    if old_versions.is_empty() {
        return Ok(CleanReport::default());
    }

    info!(
        "  Finding files from {} old version{}",
        old_versions.len(),
        if old_versions.len() == 1 { "" } else { "s" }
    );

    let mut to_remove = Vec::new();
    for stored in &old_versions {
        to_remove.extend(collect_keys(store, bucket, &stored.prefix).await?);
    }

    let mut report = CleanReport {
        removed_versions: old_versions.into_iter().map(|s| s.version).collect(),
        ..Default::default()
    };
    if to_remove.is_empty() {
        return Ok(report);
    }

    info!("  Deleting {} files", to_remove.len());
    for chunk in chunk_keys(&to_remove, DELETE_CHUNK_SIZE) {
        store.delete_objects(bucket, chunk).await?;
        report.batches += 1;
        report.deleted_keys += chunk.len();
        info!("  Removed {} files", chunk.len());
    }

    Ok(report)
}
