//! Architecture discovery and manifest merging.
//!
//! Several client architectures can emit a file at the same public path.
//! Only one copy is uploaded, and the legacy build wins when present since it
//! is readable by more clients.

use crate::{
    errors::{DeployError, DeployResult},
    models::manifest::{ArchManifest, BROWSER_ARCH_PREFIX, FileEntry, LEGACY_ARCH, ProgramJson},
};
use std::{collections::HashMap, path::Path};
use tokio::fs;
use tracing::debug;

/// Read `program.json` of every browser architecture under `programs_dir`.
///
/// Architectures are returned in directory-name order so repeated deploys of
/// the same build merge identically.
pub async fn discover_architectures(programs_dir: &Path) -> DeployResult<Vec<ArchManifest>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(programs_dir).await.map_err(|err| DeployError::Manifest {
        path: programs_dir.to_path_buf(),
        reason: format!("cannot read programs directory: {err}"),
    })?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(BROWSER_ARCH_PREFIX) && entry.file_type().await?.is_dir() {
            names.push(name);
        }
    }
    names.sort();

    let mut archs = Vec::with_capacity(names.len());
    for arch in names {
        let path = programs_dir.join(&arch).join("program.json");
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|err| DeployError::Manifest {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        let program: ProgramJson =
            serde_json::from_str(&raw).map_err(|err| DeployError::Manifest {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        debug!(%arch, files = program.manifest.len(), "read manifest");
        archs.push(ArchManifest {
            arch,
            manifest: program.manifest,
        });
    }

    Ok(archs)
}

/// Merge architecture manifests into one entry per distinct `path`.
///
/// Entries without a URL are dropped. The first architecture to claim a path
/// keeps it unless the legacy architecture claims it later.
pub fn merge_manifests(archs: &[ArchManifest]) -> Vec<FileEntry> {
    let mut unique: HashMap<&str, FileEntry> = HashMap::new();

    for arch in archs {
        let is_legacy = arch.arch == LEGACY_ARCH;
        for file in arch.manifest.iter().filter(|f| f.url_path().is_some()) {
            if unique.contains_key(file.path.as_str()) && !is_legacy {
                continue;
            }
            unique.insert(
                file.path.as_str(),
                FileEntry {
                    arch: arch.arch.clone(),
                    ..file.clone()
                },
            );
        }
    }

    unique.into_values().collect()
}
