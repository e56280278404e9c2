//! Filesystem-backed object store.
//!
//! Buckets are directories under a root path and objects are files inside
//! them, so a bucket layout on disk mirrors what an S3-style service holds.

use crate::{ObjectInfo, ObjectStore, StorageResult};
use picvault_error::{StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Content type reported for objects written without one on record.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Compare two byte strings in time independent of where they differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Filesystem object store.
///
/// Stores objects at `{root}/{bucket}/{key}`:
///
/// ```text
/// /var/picvault/blobs/
/// ├── holidays/
/// │   ├── 0cc175b9c0f1b6a831c399e269772661.png
/// │   └── 92eb5ffee6ae2fec3ad71c777531578f.jpg
/// └── tmp-thumbnail/
///     └── 4a8a08f09d37b73795649038408b5f33.png
/// ```
///
/// # Features
///
/// - **Atomic writes**: per-writer temp file + rename, readers never see partial objects
/// - **Content types**: kept in a hidden `.{key}.type` file beside each object
/// - **Signed URLs**: `{public_base_url}/{bucket}/{key}?expires=..&signature=..`,
///   checked by [`FileSystemObjectStore::verify_signature`]
pub struct FileSystemObjectStore {
    root: PathBuf,
    public_base_url: String,
    signing_secret: String,
}

impl FileSystemObjectStore {
    /// Create a new filesystem object store.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory that holds one subdirectory per bucket
    /// * `public_base_url` - URL prefix under which the root is served
    /// * `signing_secret` - Secret mixed into presigned URL signatures
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the secret is empty.
    #[tracing::instrument(skip_all)]
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> StorageResult<Self> {
        let root = root.into();
        let signing_secret = signing_secret.into();

        if signing_secret.is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidConfig(
                "signing secret must not be empty".to_string(),
            )));
        }

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::BucketCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created filesystem object store");
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signing_secret,
        })
    }

    /// Reject names that would escape the bucket layout.
    fn validate_name(name: &str) -> StorageResult<()> {
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\');
        if invalid {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(
                name.to_string(),
            )));
        }
        Ok(())
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        Self::validate_name(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        Self::validate_name(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }

    fn sign(&self, bucket: &str, key: &str, expires: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(bucket.as_bytes());
        hasher.update(b"/");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check a presigned URL's `expires` and `signature` parameters.
    ///
    /// Returns `false` for a forged signature or an expired link.
    pub fn verify_signature(&self, bucket: &str, key: &str, expires: u64, signature: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(u64::MAX);

        self.verify_signature_at(bucket, key, expires, signature, now)
    }

    /// Same as [`verify_signature`](Self::verify_signature) against an explicit clock.
    pub fn verify_signature_at(
        &self,
        bucket: &str,
        key: &str,
        expires: u64,
        signature: &str,
        now_unix_secs: u64,
    ) -> bool {
        expires >= now_unix_secs
            && constant_time_eq(self.sign(bucket, key, expires).as_bytes(), signature.as_bytes())
    }

    /// Hidden file next to an object holding its content type.
    fn content_type_path(object_path: &Path) -> PathBuf {
        let name = object_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        object_path.with_file_name(format!(".{}.type", name))
    }

    /// Write through a uniquely named temp file in `dir`, then rename into place.
    ///
    /// Concurrent writers of one path each get their own temp file; the last
    /// rename wins and readers never see a partial file.
    async fn write_atomic(dir: &Path, path: &Path, data: &[u8]) -> StorageResult<()> {
        let dir = dir.to_path_buf();
        let target = path.to_path_buf();
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(".")
                .suffix(".tmp")
                .tempfile_in(&dir)
                .map_err(|e| Self::io_error(StorageErrorKind::ObjectWrite, &dir, e))?;
            temp.write_all(&data)
                .map_err(|e| Self::io_error(StorageErrorKind::ObjectWrite, temp.path(), e))?;
            temp.persist(&target).map_err(|e| {
                StorageError::new(StorageErrorKind::ObjectWrite(format!(
                    "rename {} to {}: {}",
                    e.file.path().display(),
                    target.display(),
                    e.error
                )))
            })?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::ObjectWrite(format!("write task: {}", e))))?
    }

    fn io_error(kind: fn(String) -> StorageErrorKind, path: &Path, e: std::io::Error) -> StorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        } else {
            StorageError::new(kind(format!("{}: {}", path.display(), e)))
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let path = self.bucket_path(bucket)?;
        Ok(tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    #[tracing::instrument(skip(self))]
    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        let path = self.bucket_path(bucket)?;
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::BucketCreation(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(())
    }

    #[tracing::instrument(skip(self, data, content_type), fields(size = data.len()))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<u64> {
        let path = self.object_path(bucket, key)?;
        let bucket_dir = self.bucket_path(bucket)?;

        // Content type first, so a visible object always has one
        Self::write_atomic(&bucket_dir, &Self::content_type_path(&path), content_type.as_bytes())
            .await?;
        Self::write_atomic(&bucket_dir, &path, data).await?;

        tracing::debug!(path = %path.display(), "Wrote object");
        Ok(data.len() as u64)
    }

    async fn stat(&self, bucket: &str, key: &str) -> StorageResult<Option<ObjectInfo>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                let content_type = tokio::fs::read_to_string(Self::content_type_path(&path))
                    .await
                    .unwrap_or_else(|_| DEFAULT_CONTENT_TYPE.to_string());
                Ok(Some(ObjectInfo::new(meta.len(), content_type)))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(StorageErrorKind::ObjectRead, &path, e)),
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Self::io_error(StorageErrorKind::ObjectRead, &path, e))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Self::io_error(StorageErrorKind::ObjectDelete, &path, e)),
        }

        let type_path = Self::content_type_path(&path);
        match tokio::fs::remove_file(&type_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(StorageErrorKind::ObjectDelete, &type_path, e)),
        }
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Self::io_error(StorageErrorKind::Unavailable, &self.root, e))?;

        let mut buckets = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(StorageErrorKind::Unavailable, &self.root, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if let Some(name) = entry.file_name().to_str()
                && is_dir
                && !name.starts_with('.')
            {
                buckets.push(name.to_string());
            }
        }
        buckets.sort();
        Ok(buckets)
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        // Validate before signing so a bad key never gets a URL
        self.object_path(bucket, key)?;

        let expires = SystemTime::now()
            .checked_add(ttl)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::Presign(format!("invalid ttl {:?}", ttl)))
            })?;

        Ok(format!(
            "{}/{}/{}?expires={}&signature={}",
            self.public_base_url,
            bucket,
            key,
            expires,
            self.sign(bucket, key, expires)
        ))
    }
}
