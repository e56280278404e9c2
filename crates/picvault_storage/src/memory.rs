//! In-memory object store.

use crate::{ObjectInfo, ObjectStore, StorageResult};
use picvault_error::{StorageError, StorageErrorKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// Object store that keeps every bucket in memory.
///
/// Useful for tests and for running the catalogue without an object-storage
/// service. All data is lost when the last clone is dropped.
///
/// Presigned URLs have the form `memory://{bucket}/{key}?expires={unix_seconds}`.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<BTreeMap<String, HashMap<String, StoredObject>>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in a bucket (zero for an unknown bucket).
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<u64> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets.get_mut(bucket).ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(format!("bucket {}", bucket)))
        })?;

        objects.insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(data.len() as u64)
    }

    async fn stat(&self, bucket: &str, key: &str) -> StorageResult<Option<ObjectInfo>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| ObjectInfo::new(object.data.len() as u64, object.content_type.clone())))
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.data.clone())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", bucket, key)))
            })
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        let expires = SystemTime::now()
            .checked_add(ttl)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::Presign(format!("invalid ttl {:?}", ttl)))
            })?;

        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            key,
            expires.as_secs()
        ))
    }
}
