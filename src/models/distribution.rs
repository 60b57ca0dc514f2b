//! CDN distribution as seen by the resolver. Read-only.

use serde::{Deserialize, Serialize};

/// One origin of a distribution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    /// Origin id; setup uses the bucket name.
    pub id: String,

    /// Path scope inside the origin, `/<app-name>` for this tool.
    pub origin_path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    /// Public domain, e.g. `d111111abcdef8.cloudfront.net`.
    pub domain_name: String,
    pub origins: Vec<Origin>,
}

impl Distribution {
    /// Whether any origin serves `bucket` scoped to `/<app_name>`.
    pub fn serves(&self, bucket: &str, app_name: &str) -> bool {
        let path = format!("/{app_name}");
        self.origins
            .iter()
            .any(|origin| origin.id == bucket && origin.origin_path == path)
    }
}
