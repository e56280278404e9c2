//! Shared fixtures for coordinator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use picvault::{
    BlobStore, ImageService, MemoryMetadataRepository, MemoryObjectStore, MemoryTagCache,
    ObjectInfo, ObjectStore, StorageError, StorageErrorKind, TagCacheConfig, Thumbnailer,
};
use picvault_storage::StorageResult;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encode a solid-colour image. Different seeds give different bytes.
pub fn image_bytes(width: u32, height: u32, seed: u32, format: ImageFormat) -> Vec<u8> {
    let colour = Rgb([seed as u8, (seed >> 8) as u8, 200]);
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, colour));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode fixture");
    bytes
}

/// A small PNG unique to `seed`.
pub fn png(seed: u32) -> Vec<u8> {
    image_bytes(8, 6, seed, ImageFormat::Png)
}

/// Coordinator over in-memory stores, with handles to inspect them.
pub struct Harness {
    pub service: ImageService,
    pub objects: MemoryObjectStore,
    pub metadata: MemoryMetadataRepository,
}

impl Harness {
    pub fn new() -> Self {
        let objects = MemoryObjectStore::new();
        let metadata = MemoryMetadataRepository::new();
        let service = ImageService::new(
            BlobStore::new(Arc::new(objects.clone())),
            Arc::new(metadata.clone()),
            Thumbnailer::default(),
        );
        Self {
            service,
            objects,
            metadata,
        }
    }

    /// Same stores, with a tag cache attached.
    pub fn with_cache() -> (Self, Arc<MemoryTagCache>) {
        let cache = Arc::new(MemoryTagCache::new(TagCacheConfig::default()));
        let mut harness = Self::new();
        harness.service = harness.service.with_cache(cache.clone());
        (harness, cache)
    }

    pub async fn save(&self, directory: &str, name: &str, data: Vec<u8>, tags: &[&str]) -> i64 {
        self.service
            .save_image(
                picvault::Upload::new(directory, name, data)
                    .with_content_type("image/png")
                    .with_tags(tags.iter().copied()),
            )
            .await
            .expect("save image")
    }
}

pub fn names(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

pub fn ids(page: &picvault::ImagePage) -> HashSet<i64> {
    page.images.iter().map(|image| image.id).collect()
}

/// Object store whose deletes fail for selected keys.
#[derive(Clone)]
pub struct FailingDeleteStore {
    pub inner: MemoryObjectStore,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl FailingDeleteStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::new(),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn fail_deletes_of(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for FailingDeleteStore {
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        self.inner.bucket_exists(bucket).await
    }

    async fn make_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.inner.make_bucket(bucket).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> StorageResult<u64> {
        self.inner.put(bucket, key, data, content_type).await
    }

    async fn stat(&self, bucket: &str, key: &str) -> StorageResult<Option<ObjectInfo>> {
        self.inner.stat(bucket, key).await
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(bucket, key).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StorageError::new(StorageErrorKind::ObjectDelete(format!(
                "{}/{}: injected failure",
                bucket, key
            ))));
        }
        self.inner.delete(bucket, key).await
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        self.inner.list_buckets().await
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_url(bucket, key, ttl).await
    }
}
