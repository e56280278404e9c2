//! In-memory implementation of MetadataRepository.
//!
//! State lives behind a single async mutex. A transaction holds the lock for
//! its whole lifetime and edits a private copy, which replaces the shared
//! state on commit. Transactions are therefore fully serialized.

use crate::{
    DatabaseError, DatabaseResult, Image, ImagePage, ImageQuery, ImageTag, MetadataRepository,
    MetadataTransaction, NewImage, Tag,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-memory metadata store.
///
/// All data is lost when the last clone is dropped.
///
/// # Example
/// ```no_run
/// use picvault_metadata::{MemoryMetadataRepository, MetadataRepository};
///
/// #[tokio::main]
/// async fn main() {
///     let repo = MemoryMetadataRepository::new();
///     let tx = repo.begin().await.unwrap();
///     tx.rollback().unwrap();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataRepository {
    state: Arc<Mutex<CatalogueState>>,
}

#[derive(Debug, Clone, Default)]
struct CatalogueState {
    images: BTreeMap<i64, Image>,
    tags: BTreeMap<i64, Tag>,
    links: BTreeMap<i64, ImageTag>,
    last_image_id: i64,
    last_tag_id: i64,
    last_link_id: i64,
}

impl MemoryMetadataRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed images (for testing).
    pub async fn image_count(&self) -> usize {
        self.state.lock().await.images.len()
    }

    /// Number of committed tags (for testing).
    pub async fn tag_count(&self) -> usize {
        self.state.lock().await.tags.len()
    }

    /// Number of committed image-tag links (for testing).
    pub async fn link_count(&self) -> usize {
        self.state.lock().await.links.len()
    }
}

#[async_trait]
impl MetadataRepository for MemoryMetadataRepository {
    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> DatabaseResult<Box<dyn MetadataTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        tracing::trace!("Memory transaction started");
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<CatalogueState>,
    working: CatalogueState,
}

impl CatalogueState {
    fn tag_named(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|tag| tag.tag_name == name)
    }

    fn insert_tag(&mut self, name: &str) -> Tag {
        self.last_tag_id += 1;
        let tag = Tag {
            id: self.last_tag_id,
            tag_name: name.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn remove_links<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&ImageTag) -> bool,
    {
        let before = self.links.len();
        self.links.retain(|_, link| !predicate(link));
        before - self.links.len()
    }

    fn tag_names_of(&self, image_id: i64) -> Vec<&str> {
        // BTreeMap iteration is by link id, i.e. link order
        self.links
            .values()
            .filter(|link| link.image_id == image_id)
            .filter_map(|link| self.tags.get(&link.tag_id))
            .map(|tag| tag.tag_name.as_str())
            .collect()
    }
}

impl MetadataTransaction for MemoryTransaction {
    fn find_image(&mut self, id: i64) -> DatabaseResult<Option<Image>> {
        Ok(self.working.images.get(&id).cloned())
    }

    fn find_image_by_address(
        &mut self,
        directory: &str,
        image_code: &str,
    ) -> DatabaseResult<Option<Image>> {
        Ok(self
            .working
            .images
            .values()
            .find(|image| image.directory == directory && image.image_code == image_code)
            .cloned())
    }

    fn create_image(&mut self, new_image: &NewImage) -> DatabaseResult<Image> {
        if self
            .find_image_by_address(&new_image.directory, &new_image.image_code)?
            .is_some()
        {
            return Err(DatabaseError::conflict(format!(
                "image {} already exists in {}",
                new_image.image_code, new_image.directory
            )));
        }

        let state = &mut self.working;
        state.last_image_id += 1;
        let image = Image {
            id: state.last_image_id,
            image_name: new_image.image_name.clone(),
            image_code: new_image.image_code.clone(),
            thumbnail_code: new_image.thumbnail_code.clone(),
            thumbnail_ext: new_image.thumbnail_ext.clone(),
            ext: new_image.ext.clone(),
            size: new_image.size,
            directory: new_image.directory.clone(),
            created_at: Utc::now().naive_utc(),
        };
        state.images.insert(image.id, image.clone());
        Ok(image)
    }

    fn delete_image(&mut self, id: i64) -> DatabaseResult<()> {
        if self.working.images.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("image {}", id)));
        }
        self.working.remove_links(|link| link.image_id == id);
        Ok(())
    }

    fn thumbnail_in_use(
        &mut self,
        thumbnail_code: &str,
        thumbnail_ext: &str,
    ) -> DatabaseResult<bool> {
        Ok(self.working.images.values().any(|image| {
            image.thumbnail_code == thumbnail_code && image.thumbnail_ext == thumbnail_ext
        }))
    }

    fn find_tag(&mut self, id: i64) -> DatabaseResult<Option<Tag>> {
        Ok(self.working.tags.get(&id).cloned())
    }

    fn find_tag_by_name(&mut self, name: &str) -> DatabaseResult<Option<Tag>> {
        Ok(self.working.tag_named(name).cloned())
    }

    fn create_tag(&mut self, name: &str) -> DatabaseResult<Tag> {
        if self.working.tag_named(name).is_some() {
            return Err(DatabaseError::conflict(format!("tag {} already exists", name)));
        }
        Ok(self.working.insert_tag(name))
    }

    fn ensure_tag(&mut self, name: &str) -> DatabaseResult<Tag> {
        match self.working.tag_named(name) {
            Some(tag) => Ok(tag.clone()),
            None => Ok(self.working.insert_tag(name)),
        }
    }

    fn rename_tag(&mut self, id: i64, name: &str) -> DatabaseResult<Tag> {
        if let Some(other) = self.working.tag_named(name)
            && other.id != id
        {
            return Err(DatabaseError::conflict(format!("tag {} already exists", name)));
        }
        let tag = self
            .working
            .tags
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found(format!("tag {}", id)))?;
        tag.tag_name = name.to_string();
        Ok(tag.clone())
    }

    fn delete_tag(&mut self, id: i64) -> DatabaseResult<()> {
        if self.working.tags.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("tag {}", id)));
        }
        self.working.remove_links(|link| link.tag_id == id);
        Ok(())
    }

    fn list_tags(&mut self) -> DatabaseResult<Vec<Tag>> {
        let mut tags: Vec<Tag> = self.working.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tags)
    }

    fn link_image_tag(&mut self, image_id: i64, tag_id: i64) -> DatabaseResult<bool> {
        let state = &mut self.working;
        if !state.images.contains_key(&image_id) {
            return Err(DatabaseError::not_found(format!("image {}", image_id)));
        }
        if !state.tags.contains_key(&tag_id) {
            return Err(DatabaseError::not_found(format!("tag {}", tag_id)));
        }
        if state
            .links
            .values()
            .any(|link| link.image_id == image_id && link.tag_id == tag_id)
        {
            return Ok(false);
        }

        state.last_link_id += 1;
        let link = ImageTag {
            id: state.last_link_id,
            image_id,
            tag_id,
            created_at: Utc::now().naive_utc(),
        };
        state.links.insert(link.id, link);
        Ok(true)
    }

    fn unlink_image(&mut self, image_id: i64) -> DatabaseResult<usize> {
        Ok(self.working.remove_links(|link| link.image_id == image_id))
    }

    fn unlink_tag(&mut self, tag_id: i64) -> DatabaseResult<usize> {
        Ok(self.working.remove_links(|link| link.tag_id == tag_id))
    }

    fn query_images(&mut self, query: &ImageQuery) -> DatabaseResult<ImagePage> {
        let state = &self.working;
        let required = query.tags();

        let mut matched: Vec<&Image> = state
            .images
            .values()
            .filter(|image| image.directory == *query.directory())
            .filter(|image| {
                if required.is_empty() {
                    return true;
                }
                let carried: HashSet<&str> = state.tag_names_of(image.id).into_iter().collect();
                required.iter().all(|name| carried.contains(name.as_str()))
            })
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as i64;
        let images = matched
            .into_iter()
            .skip(query.page().offset() as usize)
            .take(query.page().limit() as usize)
            .cloned()
            .collect();

        Ok(ImagePage { images, total })
    }

    fn tags_for_images(&mut self, ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<String>>> {
        let state = &self.working;
        Ok(ids
            .iter()
            .filter(|id| state.images.contains_key(id))
            .map(|id| {
                let names = state
                    .tag_names_of(*id)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (*id, names)
            })
            .collect())
    }

    fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        tracing::trace!("Memory transaction committed");
        Ok(())
    }

    fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        tracing::trace!("Memory transaction rolled back");
        Ok(())
    }
}
