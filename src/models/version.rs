//! Deploy version: wall-clock milliseconds at upload time.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric deploy identifier.
///
/// Used both as the key segment in `app/<version>/...` and as the sort key for
/// retention. Only numeric comparison decides which version is older; clock
/// skew between deploys is not corrected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    /// Version for a deploy happening now.
    pub fn now() -> Self {
        // Pre-epoch clocks are not a case worth modelling.
        Self(Utc::now().timestamp_millis().max(0) as u64)
    }

    /// Key prefix for this version without the trailing slash, e.g. `todos/1700000000000`.
    pub fn key_prefix(&self, app_name: &str) -> String {
        format!("{}/{}", app_name, self.0)
    }

    /// Parse the version out of a listing common prefix shaped `app/<version>/`.
    ///
    /// Returns `None` for prefixes outside the app namespace or whose segment
    /// is not an integer; such prefixes are never treated as versions.
    pub fn from_prefix(app_name: &str, prefix: &str) -> Option<Self> {
        let rest = prefix.strip_prefix(app_name)?.strip_prefix('/')?;
        let segment = rest.split('/').next()?;
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok().map(Self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_round_trip() {
        let v = Version(1_700_000_000_123);
        assert_eq!(v.key_prefix("todos"), "todos/1700000000123");
        assert_eq!(
            Version::from_prefix("todos", "todos/1700000000123/"),
            Some(v)
        );
    }

    #[test]
    fn foreign_or_malformed_prefixes_ignored() {
        assert_eq!(Version::from_prefix("todos", "other/100/"), None);
        assert_eq!(Version::from_prefix("todos", "todos-old/100/"), None);
        assert_eq!(Version::from_prefix("todos", "todos/latest/"), None);
        assert_eq!(Version::from_prefix("todos", "todos/-5/"), None);
        assert_eq!(Version::from_prefix("todos", "todos//"), None);
    }

    #[test]
    fn ordering_is_numeric() {
        // "900" sorts after "1000" as a string, never as a version.
        assert!(Version(900) < Version(1000));
    }

    #[test]
    fn now_is_recent_millis() {
        // 2020-01-01T00:00:00Z in milliseconds.
        assert!(Version::now().0 > 1_577_836_800_000);
    }
}
