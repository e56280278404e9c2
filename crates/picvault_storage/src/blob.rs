//! Content-addressed blob adapter over an [`ObjectStore`].

use crate::{ObjectStore, StorageResult};
use picvault_error::{StorageError, StorageErrorKind};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Compute the content address (MD5, lowercase hex) of a payload.
pub fn content_address(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Build an object key from a content code and an extension without the dot.
///
/// An empty extension yields the bare code.
pub fn object_key(code: &str, ext: &str) -> String {
    if ext.is_empty() {
        code.to_string()
    } else {
        format!("{}.{}", code, ext)
    }
}

/// Split an object key into its content code and extension (without the dot).
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rsplit_once('.') {
        Some((code, ext)) if !code.is_empty() => (code, ext),
        _ => (key, ""),
    }
}

/// Extension of an uploaded filename, without the dot and with its case preserved.
fn filename_extension(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

/// Location and size of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct StoredBlob {
    /// Object key, `code.ext`
    key: String,
    /// Content address without extension
    code: String,
    /// Extension without the dot, possibly empty
    ext: String,
    /// Size of the stored object in bytes
    size: u64,
}

/// Blob store adapter.
///
/// Wraps an [`ObjectStore`] and owns the content-addressing rules:
/// `{bucket}/{md5(data)}.{ext}`. One bucket per directory holds originals;
/// derived artifacts are written through [`BlobStore::store_derived`].
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").finish_non_exhaustive()
    }
}

impl BlobStore {
    /// Create an adapter over an object store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// The underlying object store.
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Store an uploaded file under its content address.
    ///
    /// The key is the MD5 of `data` followed by the extension of `filename`.
    /// If an object with that key already exists its size is returned and
    /// nothing is uploaded. The directory's bucket is created on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the bucket cannot be created or the
    /// object cannot be checked or written. Nothing is retried.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store(
        &self,
        directory: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<StoredBlob> {
        self.store_keyed(directory, filename_extension(filename), data, content_type)
            .await
    }

    /// Store a derived artifact whose extension comes from its encoding.
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store_derived(
        &self,
        bucket: &str,
        ext: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<StoredBlob> {
        self.store_keyed(bucket, ext, data, content_type).await
    }

    async fn store_keyed(
        &self,
        bucket: &str,
        ext: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<StoredBlob> {
        let code = content_address(data);
        let key = object_key(&code, ext);

        self.ensure_bucket(bucket).await?;

        // Same content, same key: skip the upload
        if let Some(info) = self.store.stat(bucket, &key).await? {
            tracing::debug!(bucket, key = %key, "Object already stored, skipping upload");
            return Ok(StoredBlob {
                key,
                code,
                ext: ext.to_string(),
                size: *info.size(),
            });
        }

        let size = self.store.put(bucket, &key, data, content_type).await?;

        tracing::info!(bucket, key = %key, size, "Stored blob");

        Ok(StoredBlob {
            key,
            code,
            ext: ext.to_string(),
            size,
        })
    }

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        if bucket.is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(
                "bucket name is empty".to_string(),
            )));
        }

        if !self.store.bucket_exists(bucket).await? {
            self.store.make_bucket(bucket).await?;
            tracing::info!(bucket, "Created bucket");
        }
        Ok(())
    }

    /// Read a blob's bytes.
    pub async fn fetch(&self, directory: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.store.get(directory, key).await
    }

    /// Delete a blob.
    ///
    /// Absence is not reported; callers must not rely on this to detect it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, directory: &str, key: &str) -> StorageResult<()> {
        self.store.delete(directory, key).await?;
        tracing::debug!(directory, key, "Deleted blob");
        Ok(())
    }

    /// Time-limited retrieval URL for a blob.
    pub async fn presigned_url(
        &self,
        directory: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.store.presigned_url(directory, key, ttl).await
    }

    /// Names of all directories (buckets).
    pub async fn list_directories(&self) -> StorageResult<Vec<String>> {
        self.store.list_buckets().await
    }
}
