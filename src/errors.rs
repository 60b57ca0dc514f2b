//! Error types shared by every command.
//!
//! Remote failures are flattened into strings at the client boundary so the
//! core never depends on SDK error generics.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Hint attached to lookups that only `setup` can satisfy.
pub const SETUP_HINT: &str = "Run the setup step to create the bucket and CloudFront distribution";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no bucket found with prefix `{prefix}`")]
    NoBucket { prefix: String, hint: &'static str },
    #[error("no-distribution")]
    NoDistribution { hint: &'static str },
    #[error("manifest `{path}` invalid: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("bundle config `{path}` invalid: {reason}")]
    Bundle { path: PathBuf, reason: String },
    #[error("{failed} of {total} uploads failed")]
    UploadFailed { failed: usize, total: usize },
    #[error("delete batch of {0} keys exceeds the per-request limit")]
    InvalidBatch(usize),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("cdn error: {0}")]
    Cdn(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    /// Shortcut for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Remediation hint for errors the operator can fix by running setup.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoBucket { hint, .. } | Self::NoDistribution { hint } => Some(*hint),
            _ => None,
        }
    }
}
