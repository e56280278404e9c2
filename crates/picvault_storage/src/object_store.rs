//! Object storage capability trait.

use crate::StorageResult;
use std::time::Duration;

/// Size and content type of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct ObjectInfo {
    /// Stored size in bytes
    size: u64,
    /// Content type recorded at upload time
    content_type: String,
}

impl ObjectInfo {
    /// Create object info from a size and content type.
    pub fn new(size: u64, content_type: impl Into<String>) -> Self {
        Self {
            size,
            content_type: content_type.into(),
        }
    }
}

/// Trait for object-storage services.
///
/// Objects live in flat buckets and are addressed by `(bucket, key)`. This is
/// the raw capability; content addressing and bucket bootstrapping live in
/// [`BlobStore`](crate::BlobStore).
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool>;

    /// Create a bucket.
    ///
    /// Creating a bucket that already exists is not an error.
    async fn make_bucket(&self, bucket: &str) -> StorageResult<()>;

    /// Store an object, replacing any existing object under the same key.
    ///
    /// # Returns
    ///
    /// The number of bytes stored
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Look up an object's metadata, `None` if it does not exist.
    async fn stat(&self, bucket: &str, key: &str) -> StorageResult<Option<ObjectInfo>>;

    /// Check if an object exists.
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self.stat(bucket, key).await?.is_some())
    }

    /// Read an object's bytes.
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object.
    ///
    /// Deleting an absent object succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Names of all buckets.
    async fn list_buckets(&self) -> StorageResult<Vec<String>>;

    /// Produce a time-limited retrieval URL for an object.
    async fn presigned_url(&self, bucket: &str, key: &str, ttl: Duration)
    -> StorageResult<String>;
}
