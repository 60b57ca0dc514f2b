//! In-memory `ObjectStore` with S3 listing semantics, for tests.

use crate::{
    errors::{DeployError, DeployResult},
    models::listing::ListingPage,
    services::object_store::{MAX_DELETE_BATCH, ObjectStore},
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    path::Path,
    sync::Mutex,
};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: Vec<String>,
    page_size: Option<usize>,
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing_keys: HashSet<String>,
    /// Keys of every delete request, in order.
    pub delete_batches: Mutex<Vec<Vec<String>>>,
    pub list_calls: Mutex<usize>,
}

impl MemoryObjectStore {
    pub fn new(buckets: &[&str]) -> Self {
        Self {
            buckets: buckets.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Return at most `size` entries (keys plus prefixes) per listing page.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Make uploads to `key` fail.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn insert(&self, bucket: &str, key: &str) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                content_type: "application/octet-stream".into(),
                body: Vec::new(),
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_buckets(&self) -> DeployResult<Vec<String>> {
        Ok(self.buckets.clone())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> DeployResult<ListingPage> {
        *self.list_calls.lock().unwrap() += 1;

        let mut keys = BTreeSet::new();
        let mut common_prefixes = BTreeSet::new();
        for (b, key) in self.objects.lock().unwrap().keys() {
            if b != bucket || !key.starts_with(prefix) {
                continue;
            }
            match compute_common_prefix(key, prefix, delimiter) {
                Some(common) => common_prefixes.insert(common),
                None => keys.insert(key.clone()),
            };
        }

        // Keys and prefixes share one ordered result set, as in S3.
        let mut entries: Vec<(String, bool)> = keys
            .into_iter()
            .map(|k| (k, false))
            .chain(common_prefixes.into_iter().map(|p| (p, true)))
            .collect();
        entries.sort();

        let start = continuation_token
            .map(|token| token.parse::<usize>())
            .transpose()
            .map_err(|err| DeployError::Storage(format!("bad continuation token: {err}")))?
            .unwrap_or(0);
        let page_size = self.page_size.unwrap_or(usize::MAX);
        let end = start.saturating_add(page_size).min(entries.len());

        let mut page = ListingPage::default();
        for (name, is_prefix) in entries[start.min(end)..end].iter().cloned() {
            if is_prefix {
                page.common_prefixes.push(name);
            } else {
                page.keys.push(name);
            }
        }
        if end < entries.len() {
            page.next_continuation_token = Some(end.to_string());
        }
        Ok(page)
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> DeployResult<()> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(DeployError::InvalidBatch(keys.len()));
        }
        self.delete_batches.lock().unwrap().push(keys.to_vec());
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> DeployResult<()> {
        if self.failing_keys.contains(key) {
            return Err(DeployError::Storage(format!("S3 PutObject: injected failure for {key}")));
        }
        let body = tokio::fs::read(source).await?;
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                content_type: content_type.to_string(),
                body,
            },
        );
        Ok(())
    }
}

/// Group `key` under its first delimiter after `prefix`, if any.
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(prefix)?;
    let pos = after_prefix.find(delimiter)?;
    let mut combined = String::from(prefix);
    combined.push_str(&after_prefix[..pos + delimiter.len()]);
    Some(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::object_store::list_level;

    #[tokio::test]
    async fn delimiter_collapses_deeper_levels() {
        let store = MemoryObjectStore::new(&["b"]);
        for key in ["app/1/a.js", "app/1/img/x.png", "app/1/img/deep/y.png", "app/2/a.js"] {
            store.insert("b", key);
        }

        let top = store.list_objects("b", "app/", "/", None).await.unwrap();
        assert!(top.keys.is_empty());
        assert_eq!(top.common_prefixes, vec!["app/1/", "app/2/"]);

        let v1 = store.list_objects("b", "app/1/", "/", None).await.unwrap();
        assert_eq!(v1.keys, vec!["app/1/a.js"]);
        assert_eq!(v1.common_prefixes, vec!["app/1/img/"]);
    }

    #[tokio::test]
    async fn pages_are_followed_to_the_end() {
        let store = MemoryObjectStore::new(&["b"]).with_page_size(2);
        for i in 0..5 {
            store.insert("b", &format!("app/{i}/index.html"));
        }

        let first = store.list_objects("b", "app/", "/", None).await.unwrap();
        assert_eq!(first.common_prefixes.len(), 2);
        assert!(first.next_continuation_token.is_some());

        let level = list_level(&store, "b", "app/").await.unwrap();
        assert_eq!(level.common_prefixes.len(), 5);
        // 3 pages for 5 entries.
        assert_eq!(*store.list_calls.lock().unwrap(), 4);
    }
}
