//! Transactional metadata interface.

use crate::{DatabaseResult, Image, ImagePage, ImageQuery, NewImage, Tag};
use async_trait::async_trait;
use std::collections::HashMap;

/// Entry point to a metadata backend.
///
/// All reads and writes happen inside a [`MetadataTransaction`] obtained from
/// [`begin`](MetadataRepository::begin).
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> DatabaseResult<Box<dyn MetadataTransaction>>;
}

/// A unit of work against the metadata store.
///
/// Changes become visible to other transactions only after
/// [`commit`](MetadataTransaction::commit). Dropping a transaction without
/// committing discards its changes.
pub trait MetadataTransaction: Send {
    /// Look up an image by id.
    fn find_image(&mut self, id: i64) -> DatabaseResult<Option<Image>>;

    /// Look up an image by its content address within a directory.
    fn find_image_by_address(
        &mut self,
        directory: &str,
        image_code: &str,
    ) -> DatabaseResult<Option<Image>>;

    /// Insert an image.
    ///
    /// Returns [`Conflict`](crate::DatabaseErrorKind::Conflict) when an image
    /// with the same `(directory, image_code)` exists.
    fn create_image(&mut self, new_image: &NewImage) -> DatabaseResult<Image>;

    /// Delete an image and its tag links.
    fn delete_image(&mut self, id: i64) -> DatabaseResult<()>;

    /// Whether any image still references this thumbnail object.
    fn thumbnail_in_use(
        &mut self,
        thumbnail_code: &str,
        thumbnail_ext: &str,
    ) -> DatabaseResult<bool>;

    /// Look up a tag by id.
    fn find_tag(&mut self, id: i64) -> DatabaseResult<Option<Tag>>;

    /// Look up a tag by exact name.
    fn find_tag_by_name(&mut self, name: &str) -> DatabaseResult<Option<Tag>>;

    /// Insert a tag, failing with `Conflict` if the name is taken.
    fn create_tag(&mut self, name: &str) -> DatabaseResult<Tag>;

    /// Return the tag named `name`, creating it if needed.
    fn ensure_tag(&mut self, name: &str) -> DatabaseResult<Tag>;

    /// Rename a tag.
    ///
    /// `NotFound` if the id is absent, `Conflict` if another tag already has
    /// `name`.
    fn rename_tag(&mut self, id: i64, name: &str) -> DatabaseResult<Tag>;

    /// Delete a tag and its links.
    fn delete_tag(&mut self, id: i64) -> DatabaseResult<()>;

    /// All tags, oldest first.
    fn list_tags(&mut self) -> DatabaseResult<Vec<Tag>>;

    /// Link an image to a tag. Returns `false` if the link already existed.
    fn link_image_tag(&mut self, image_id: i64, tag_id: i64) -> DatabaseResult<bool>;

    /// Remove every link of an image. Returns the number removed.
    fn unlink_image(&mut self, image_id: i64) -> DatabaseResult<usize>;

    /// Remove every link of a tag. Returns the number removed.
    fn unlink_tag(&mut self, tag_id: i64) -> DatabaseResult<usize>;

    /// Run a directory listing, optionally restricted to a tag intersection.
    fn query_images(&mut self, query: &ImageQuery) -> DatabaseResult<ImagePage>;

    /// Tag names per image, in link order.
    ///
    /// Every requested id that exists gets an entry, empty when untagged.
    fn tags_for_images(&mut self, ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<String>>>;

    /// Make every change durable.
    fn commit(self: Box<Self>) -> DatabaseResult<()>;

    /// Discard every change.
    fn rollback(self: Box<Self>) -> DatabaseResult<()>;
}
