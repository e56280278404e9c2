//! Save, delete and query coordination across blob and metadata stores.
//!
//! Metadata changes of one call happen in one transaction. Blob writes are
//! not transactional: a failure after a blob was written leaves it orphaned,
//! and a failed batch delete may already have removed some blobs.

use crate::config::PicvaultConfig;
use crate::upload::{ImageView, Upload};
use crate::{DEFAULT_THUMBNAIL_BUCKET, DEFAULT_URL_TTL};
use picvault_cache::{MemoryTagCache, TagListCache};
use picvault_error::{
    DatabaseError, DatabaseErrorKind, PicvaultResult, ThumbnailError, ThumbnailErrorKind,
    ValidationError,
};
use picvault_metadata::{
    Image, ImagePage, ImageQuery, MetadataRepository, NewImageBuilder, Page, Tag,
};
use picvault_storage::{BlobStore, FileSystemObjectStore, object_key};
use picvault_thumbnail::Thumbnailer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Progress of a save, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
enum SaveState {
    UploadingOriginal,
    CheckingDedup,
    DerivingThumbnail,
    UploadingThumbnail,
    PersistingMetadata,
    LinkingTags,
    Committed,
}

fn enter(state: SaveState) {
    debug!(state = %state, "Save progressing");
}

fn require_name(name: &str) -> PicvaultResult<()> {
    if name.is_empty() {
        return Err(ValidationError::new("tag name must not be empty").into());
    }
    Ok(())
}

fn image_not_found(id: i64) -> DatabaseError {
    DatabaseError::not_found(format!("image {}", id))
}

/// The image catalogue.
///
/// # Example
///
/// ```
/// use picvault::{ImageService, Upload};
/// use picvault_metadata::MemoryMetadataRepository;
/// use picvault_storage::{BlobStore, MemoryObjectStore};
/// use picvault_thumbnail::Thumbnailer;
/// use std::sync::Arc;
///
/// # async fn example(png: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
/// let service = ImageService::new(
///     BlobStore::new(Arc::new(MemoryObjectStore::new())),
///     Arc::new(MemoryMetadataRepository::new()),
///     Thumbnailer::default(),
/// );
///
/// let id = service
///     .save_image(Upload::new("holidays", "beach.png", png).with_tags(["summer"]))
///     .await?;
/// let page = service.list_images("holidays", &["summer".to_string()], 1, 10).await?;
/// assert_eq!(page.images[0].id, id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ImageService {
    blobs: BlobStore,
    metadata: Arc<dyn MetadataRepository>,
    thumbnailer: Thumbnailer,
    cache: Option<Arc<dyn TagListCache>>,
    thumbnail_bucket: String,
    url_ttl: Duration,
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService")
            .field("blobs", &self.blobs)
            .field("thumbnailer", &self.thumbnailer)
            .field("cache", &self.cache)
            .field("thumbnail_bucket", &self.thumbnail_bucket)
            .field("url_ttl", &self.url_ttl)
            .finish_non_exhaustive()
    }
}

impl ImageService {
    /// Create a service without a tag cache, using the default thumbnail
    /// bucket and URL lifetime.
    pub fn new(
        blobs: BlobStore,
        metadata: Arc<dyn MetadataRepository>,
        thumbnailer: Thumbnailer,
    ) -> Self {
        Self {
            blobs,
            metadata,
            thumbnailer,
            cache: None,
            thumbnail_bucket: DEFAULT_THUMBNAIL_BUCKET.to_string(),
            url_ttl: DEFAULT_URL_TTL,
        }
    }

    /// Build a service over a filesystem object store as configured.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store root cannot be created or no
    /// signing secret is configured.
    pub fn from_config(
        config: &PicvaultConfig,
        metadata: Arc<dyn MetadataRepository>,
    ) -> PicvaultResult<Self> {
        let storage = config.storage();
        let store = FileSystemObjectStore::new(
            storage.root().clone(),
            storage.public_base_url().as_str(),
            storage.signing_secret().as_str(),
        )?;

        let mut service = Self::new(
            BlobStore::new(Arc::new(store)),
            metadata,
            Thumbnailer::new(config.thumbnail().clone()),
        )
        .with_thumbnail_bucket(storage.thumbnail_bucket().as_str())
        .with_url_ttl(Duration::from_secs(*storage.url_ttl_secs()));

        if *config.cache().enabled() {
            service = service.with_cache(Arc::new(MemoryTagCache::new(config.cache().clone())));
        }
        Ok(service)
    }

    /// Serve tag lookups through `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn TagListCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bucket that holds every thumbnail.
    pub fn with_thumbnail_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.thumbnail_bucket = bucket.into();
        self
    }

    /// Lifetime of presigned URLs in views.
    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl;
        self
    }

    /// Blob store in use.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Bucket that holds every thumbnail.
    pub fn thumbnail_bucket(&self) -> &str {
        &self.thumbnail_bucket
    }

    /// Save an upload and return its image id.
    ///
    /// Byte-identical content already saved in the same directory resolves
    /// to the existing image; its tags are left unchanged.
    ///
    /// # Errors
    ///
    /// Storage, thumbnail and database errors propagate unchanged after the
    /// open transaction is rolled back. Blobs already written stay.
    #[instrument(
        skip(self, upload),
        fields(
            directory = %upload.directory(),
            filename = %upload.filename(),
            size = upload.data().len(),
            image_id = tracing::field::Empty,
        )
    )]
    pub async fn save_image(&self, upload: Upload) -> PicvaultResult<i64> {
        let (directory, filename, content_type, data, tags) = upload.into_parts();

        enter(SaveState::UploadingOriginal);
        let original = self
            .blobs
            .store(&directory, &filename, &data, &content_type)
            .await?;

        enter(SaveState::CheckingDedup);
        let mut tx = self.metadata.begin().await?;
        let existing = tx.find_image_by_address(&directory, original.code())?;
        tx.rollback()?;
        if let Some(image) = existing {
            tracing::Span::current().record("image_id", image.id);
            info!("Content already catalogued");
            return Ok(image.id);
        }

        enter(SaveState::DerivingThumbnail);
        let thumbnailer = self.thumbnailer.clone();
        let thumbnail = tokio::task::spawn_blocking(move || thumbnailer.derive(&data))
            .await
            .map_err(|e| ThumbnailError::new(ThumbnailErrorKind::Task(e.to_string())))??;

        enter(SaveState::UploadingThumbnail);
        let format = *thumbnail.format();
        let stored_thumbnail = self
            .blobs
            .store_derived(
                &self.thumbnail_bucket,
                format.extension(),
                thumbnail.data(),
                format.content_type(),
            )
            .await?;

        enter(SaveState::PersistingMetadata);
        let size = i64::try_from(*original.size())
            .map_err(|_| ValidationError::new("image is too large to catalogue"))?;
        let new_image = NewImageBuilder::default()
            .image_name(filename.as_str())
            .image_code(original.code().as_str())
            .ext(original.ext().as_str())
            .size(size)
            .directory(directory.as_str())
            .thumbnail_code(stored_thumbnail.code().as_str())
            .thumbnail_ext(stored_thumbnail.ext().as_str())
            .build()
            .map_err(|e| ValidationError::new(e.to_string()))?;

        let mut tx = self.metadata.begin().await?;
        let image = match tx.create_image(&new_image) {
            Ok(image) => image,
            Err(err) if matches!(err.kind, DatabaseErrorKind::Conflict(_)) => {
                // A concurrent save of the same content committed first
                let winner = tx
                    .find_image_by_address(&directory, original.code())?
                    .ok_or(err)?;
                tx.rollback()?;
                tracing::Span::current().record("image_id", winner.id);
                info!("Concurrent save won, reusing its image");
                return Ok(winner.id);
            }
            Err(err) => return Err(err.into()),
        };

        enter(SaveState::LinkingTags);
        for name in &tags {
            let tag = tx.ensure_tag(name)?;
            tx.link_image_tag(image.id, tag.id)?;
        }

        tx.commit()?;
        enter(SaveState::Committed);

        tracing::Span::current().record("image_id", image.id);
        info!(tags = tags.len(), "Image saved");
        Ok(image.id)
    }

    /// Delete a batch of images with their blobs.
    ///
    /// Metadata for the whole batch is removed in one transaction: any
    /// missing id or failing blob delete leaves every row in place. Blob
    /// deletions issued before the failure are not undone.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn delete_images(&self, ids: &[i64]) -> PicvaultResult<()> {
        // A repeated id names the same image once
        let mut seen = HashSet::with_capacity(ids.len());
        let ids: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut tx = self.metadata.begin().await?;

        for id in &ids {
            let image = tx.find_image(*id)?.ok_or_else(|| image_not_found(*id))?;
            tx.unlink_image(image.id)?;
            tx.delete_image(image.id)?;

            self.blobs
                .delete(&image.directory, &object_key(&image.image_code, &image.ext))
                .await?;

            if tx.thumbnail_in_use(&image.thumbnail_code, &image.thumbnail_ext)? {
                debug!(image_id = image.id, "Thumbnail shared with another image, keeping it");
            } else {
                self.blobs
                    .delete(
                        &self.thumbnail_bucket,
                        &object_key(&image.thumbnail_code, &image.thumbnail_ext),
                    )
                    .await?;
            }
        }

        tx.commit()?;

        if let Some(cache) = &self.cache {
            cache.invalidate_many(&ids);
        }
        info!("Images deleted");
        Ok(())
    }

    /// One page of a directory, optionally restricted to images carrying
    /// every tag in `tags`. Non-positive page values take their defaults.
    #[instrument(skip(self, tags), fields(tags = tags.len()))]
    pub async fn list_images(
        &self,
        directory: &str,
        tags: &[String],
        page: i64,
        page_size: i64,
    ) -> PicvaultResult<ImagePage> {
        let query = ImageQuery::new(directory, Page::new(page, page_size)).with_tags(tags.iter().cloned());

        let mut tx = self.metadata.begin().await?;
        let page = tx.query_images(&query)?;
        tx.rollback()?;

        debug!(total = page.total, returned = page.images.len(), "Listed images");
        Ok(page)
    }

    /// Attach URLs and tags to a page of images.
    pub async fn describe_images(&self, page: &ImagePage) -> PicvaultResult<Vec<ImageView>> {
        self.describe(&page.images).await
    }

    /// A single image with URLs and tags.
    pub async fn get_image(&self, id: i64) -> PicvaultResult<ImageView> {
        let mut tx = self.metadata.begin().await?;
        let image = tx.find_image(id)?;
        tx.rollback()?;

        let image = image.ok_or_else(|| image_not_found(id))?;
        let mut views = self.describe(std::slice::from_ref(&image)).await?;
        views.pop().ok_or_else(|| image_not_found(id).into())
    }

    async fn describe(&self, images: &[Image]) -> PicvaultResult<Vec<ImageView>> {
        let ids: Vec<i64> = images.iter().map(|image| image.id).collect();
        let mut tags = self.tags_for_images(&ids).await?;

        let mut views = Vec::with_capacity(images.len());
        for image in images {
            let url = self
                .blobs
                .presigned_url(
                    &image.directory,
                    &object_key(&image.image_code, &image.ext),
                    self.url_ttl,
                )
                .await?;
            let thumbnail_url = self
                .blobs
                .presigned_url(
                    &self.thumbnail_bucket,
                    &object_key(&image.thumbnail_code, &image.thumbnail_ext),
                    self.url_ttl,
                )
                .await?;

            views.push(ImageView {
                id: image.id,
                name: image.image_name.clone(),
                directory: image.directory.clone(),
                ext: image.ext.clone(),
                size: image.size,
                created_at: image.created_at,
                url,
                thumbnail_url,
                tags: tags.remove(&image.id).unwrap_or_default(),
            });
        }
        Ok(views)
    }

    /// Tag names per existing image, in link order.
    ///
    /// Served from the tag cache where possible; misses are loaded in one
    /// query and cached.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn tags_for_images(&self, ids: &[i64]) -> PicvaultResult<HashMap<i64, Vec<String>>> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();

        match &self.cache {
            Some(cache) => {
                for id in ids {
                    match cache.get(*id) {
                        Some(tags) => {
                            found.insert(*id, tags);
                        }
                        None => missing.push(*id),
                    }
                }
            }
            None => missing.extend_from_slice(ids),
        }

        if missing.is_empty() {
            return Ok(found);
        }

        let mut tx = self.metadata.begin().await?;
        let loaded = tx.tags_for_images(&missing)?;
        tx.rollback()?;

        debug!(cached = found.len(), loaded = loaded.len(), "Resolved image tags");
        if let Some(cache) = &self.cache {
            for (id, tags) in &loaded {
                cache.set(*id, tags.clone());
            }
        }
        found.extend(loaded);
        Ok(found)
    }

    /// Directory names, excluding the thumbnail bucket.
    pub async fn list_directories(&self) -> PicvaultResult<Vec<String>> {
        let mut directories = self.blobs.list_directories().await?;
        directories.retain(|name| *name != self.thumbnail_bucket);
        Ok(directories)
    }

    /// All tags, oldest first.
    pub async fn list_tags(&self) -> PicvaultResult<Vec<Tag>> {
        let mut tx = self.metadata.begin().await?;
        let tags = tx.list_tags()?;
        tx.rollback()?;
        Ok(tags)
    }

    /// Create a tag. Fails with a conflict if the name exists.
    #[instrument(skip(self))]
    pub async fn create_tag(&self, name: &str) -> PicvaultResult<Tag> {
        require_name(name)?;

        let mut tx = self.metadata.begin().await?;
        let tag = tx.create_tag(name)?;
        tx.commit()?;

        info!(tag_id = tag.id, "Tag created");
        Ok(tag)
    }

    /// Rename a tag.
    ///
    /// Not-found if the id is absent, conflict if another tag has `name`.
    #[instrument(skip(self))]
    pub async fn rename_tag(&self, id: i64, name: &str) -> PicvaultResult<Tag> {
        require_name(name)?;

        let mut tx = self.metadata.begin().await?;
        let tag = tx.rename_tag(id, name)?;
        tx.commit()?;

        // Any image may carry the tag
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        info!("Tag renamed");
        Ok(tag)
    }

    /// Delete a tag and its links. Images are untouched.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: i64) -> PicvaultResult<()> {
        let mut tx = self.metadata.begin().await?;
        if tx.find_tag(id)?.is_none() {
            return Err(DatabaseError::not_found(format!("tag {}", id)).into());
        }
        let unlinked = tx.unlink_tag(id)?;
        tx.delete_tag(id)?;
        tx.commit()?;

        if let Some(cache) = &self.cache {
            cache.clear();
        }
        info!(unlinked, "Tag deleted");
        Ok(())
    }

    /// Attach tags to images, creating tags on demand.
    ///
    /// Every id must exist; existing links are kept as they are.
    #[instrument(skip(self))]
    pub async fn add_tags_to_images(&self, ids: &[i64], names: &[String]) -> PicvaultResult<()> {
        let mut tx = self.metadata.begin().await?;

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            tags.push(tx.ensure_tag(name)?);
        }

        let mut linked = 0usize;
        for id in ids {
            if tx.find_image(*id)?.is_none() {
                return Err(image_not_found(*id).into());
            }
            for tag in &tags {
                if tx.link_image_tag(*id, tag.id)? {
                    linked += 1;
                }
            }
        }
        tx.commit()?;

        if let Some(cache) = &self.cache {
            cache.invalidate_many(ids);
        }
        info!(linked, "Tags attached");
        Ok(())
    }

    /// Replace an image's tags with `names`.
    #[instrument(skip(self))]
    pub async fn replace_image_tags(&self, id: i64, names: &[String]) -> PicvaultResult<()> {
        let mut tx = self.metadata.begin().await?;
        if tx.find_image(id)?.is_none() {
            return Err(image_not_found(id).into());
        }

        tx.unlink_image(id)?;
        for name in names {
            let tag = tx.ensure_tag(name)?;
            tx.link_image_tag(id, tag.id)?;
        }
        tx.commit()?;

        if let Some(cache) = &self.cache {
            cache.invalidate(id);
        }
        info!(tags = names.len(), "Image tags replaced");
        Ok(())
    }
}
