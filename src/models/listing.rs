//! One page of a delimiter-scoped listing.

/// Result of a single `ListObjectsV2`-style call.
///
/// With a delimiter, `keys` holds only objects directly under the requested
/// prefix and every deeper level is collapsed into `common_prefixes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub keys: Vec<String>,
    pub common_prefixes: Vec<String>,
    /// Token for the next page; `None` on the last page.
    pub next_continuation_token: Option<String>,
}
