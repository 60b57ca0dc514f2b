//! Per-architecture build manifests (`programs/<arch>/program.json`).

use serde::{Deserialize, Serialize};

/// Only client architectures share this prefix; server code is never uploaded.
pub const BROWSER_ARCH_PREFIX: &str = "web.browser";

/// Preferred source when several architectures emit the same path.
pub const LEGACY_ARCH: &str = "web.browser.legacy";

/// A single file emitted by one architecture's build.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Location relative to the architecture's output directory.
    pub path: String,

    /// Public URL, possibly with a cache-busting query string. Entries
    /// without one are not servable on their own.
    #[serde(default)]
    pub url: Option<String>,

    /// Architecture the file is read from. Filled in during merging.
    #[serde(default)]
    pub arch: String,
}

impl FileEntry {
    /// URL with any query string removed; this is the key suffix under the
    /// version prefix.
    pub fn url_path(&self) -> Option<&str> {
        let url = self.url.as_deref()?;
        let path = url.split('?').next().unwrap_or(url);
        (!path.is_empty()).then_some(path)
    }
}

/// One architecture and the files its build produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchManifest {
    pub arch: String,
    pub manifest: Vec<FileEntry>,
}

/// The subset of `program.json` this tool reads.
#[derive(Deserialize, Debug)]
pub struct ProgramJson {
    pub manifest: Vec<FileEntry>,
}
