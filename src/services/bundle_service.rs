//! Records the deployed CDN version in the built server bundle.
//!
//! The build leaves `config.json` read-only, so the write temporarily makes
//! it writable and restores the original mode afterwards, also on failure.

use crate::{
    errors::{DeployError, DeployResult},
    models::version::Version,
};
use serde_json::Value;
use std::{
    fs::Permissions,
    future::Future,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, warn};

pub const CDN_VERSION_FIELD: &str = "cdnVersion";

/// `<build>/bundle/programs/server/config.json`
pub fn server_config_path(build_location: &Path) -> PathBuf {
    build_location
        .join("bundle")
        .join("programs")
        .join("server")
        .join("config.json")
}

/// Set `cdnVersion` in the server config of the bundle at `build_location`.
pub async fn inject_version(build_location: &Path, version: Version) -> DeployResult<()> {
    let path = server_config_path(build_location);
    let invalid = |reason: String| DeployError::Bundle {
        path: path.clone(),
        reason,
    };

    let raw = fs::read_to_string(&path)
        .await
        .map_err(|err| invalid(err.to_string()))?;
    let mut config: Value = serde_json::from_str(&raw).map_err(|err| invalid(err.to_string()))?;
    config
        .as_object_mut()
        .ok_or_else(|| invalid("top-level value is not an object".into()))?
        .insert(CDN_VERSION_FIELD.into(), Value::from(version.0));
    let rendered = serde_json::to_string_pretty(&config)?;

    let target = path.clone();
    write_relaxed(&path, move || fs::write(target, rendered))
        .await
        .map_err(|err| invalid(err.to_string()))?;

    debug!(path = %path.display(), %version, "injected cdn version");
    Ok(())
}

/// Run `write` with `path` made writable, then put the original mode back.
///
/// The mode is restored whether or not `write` succeeds. A failed write is
/// the error returned; a restore failure after it is only logged.
async fn write_relaxed<F, Fut>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let original = fs::metadata(path).await?.permissions();
    fs::set_permissions(path, writable(&original)).await?;
    let written = write().await;
    let restored = fs::set_permissions(path, original).await;

    match (written, restored) {
        (Err(err), Err(restore_err)) => {
            warn!(path = %path.display(), error = %restore_err, "could not restore file mode");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), restored) => restored,
    }
}

#[cfg(unix)]
fn writable(perms: &Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(perms.mode() | 0o200)
}

#[cfg(not(unix))]
fn writable(perms: &Permissions) -> Permissions {
    let mut perms = perms.clone();
    perms.set_readonly(false);
    perms
}
