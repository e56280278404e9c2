//! Tag list cache implementation.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Cache of tag names per image id.
///
/// Callers invalidate entries whenever an image's tags change.
pub trait TagListCache: Send + Sync + std::fmt::Debug {
    /// Cached tags for an image, if present and fresh.
    fn get(&self, image_id: i64) -> Option<Vec<String>>;

    /// Store the tags of an image.
    fn set(&self, image_id: i64, tags: Vec<String>);

    /// Forget one image.
    fn invalidate(&self, image_id: i64);

    /// Forget several images.
    fn invalidate_many(&self, image_ids: &[i64]) {
        for id in image_ids {
            self.invalidate(*id);
        }
    }

    /// Forget everything.
    fn clear(&self);
}

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    tags: Vec<String>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }
}

/// Configuration for the tag cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct TagCacheConfig {
    /// TTL for cached entries (seconds)
    #[serde(default = "default_ttl")]
    default_ttl: u64,

    /// Maximum cache size (number of images)
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    300
}

fn default_max_size() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for TagCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<i64, CacheEntry>,
    access_order: VecDeque<i64>,
}

impl CacheState {
    fn forget(&mut self, image_id: i64) -> bool {
        if let Some(pos) = self.access_order.iter().position(|id| *id == image_id) {
            self.access_order.remove(pos);
        }
        self.entries.remove(&image_id).is_some()
    }

    fn touch(&mut self, image_id: i64) {
        if let Some(pos) = self.access_order.iter().position(|id| *id == image_id) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(image_id);
    }
}

/// In-process tag cache with TTL expiry and LRU eviction.
///
/// # Example
///
/// ```
/// use picvault_cache::{MemoryTagCache, TagCacheConfig, TagListCache};
///
/// let cache = MemoryTagCache::new(TagCacheConfig::default().with_max_size(2));
/// cache.set(1, vec!["beach".to_string()]);
/// assert_eq!(cache.get(1), Some(vec!["beach".to_string()]));
///
/// cache.invalidate(1);
/// assert_eq!(cache.get(1), None);
/// ```
#[derive(Debug)]
pub struct MemoryTagCache {
    config: TagCacheConfig,
    state: Mutex<CacheState>,
}

impl MemoryTagCache {
    /// Create a new cache with configuration.
    pub fn new(config: TagCacheConfig) -> Self {
        tracing::debug!(
            default_ttl = config.default_ttl,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new MemoryTagCache"
        );
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Cache configuration.
    pub fn config(&self) -> &TagCacheConfig {
        &self.config
    }

    // A panic mid-update leaves at worst a stale entry, so keep serving
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&self) -> usize {
        let mut state = self.state();
        let expired: Vec<i64> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            state.forget(*id);
        }

        if !expired.is_empty() {
            tracing::info!(
                removed = expired.len(),
                remaining = state.entries.len(),
                "Cleaned up expired cache entries"
            );
        }
        expired.len()
    }

    /// Get number of cached entries.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }
}

impl Default for MemoryTagCache {
    fn default() -> Self {
        Self::new(TagCacheConfig::default())
    }
}

impl TagListCache for MemoryTagCache {
    #[tracing::instrument(skip(self))]
    fn get(&self, image_id: i64) -> Option<Vec<String>> {
        if !self.config.enabled {
            return None;
        }

        let mut state = self.state();
        let entry = state.entries.get(&image_id)?;
        if entry.is_expired() {
            tracing::debug!("Cache entry expired, removing");
            state.forget(image_id);
            return None;
        }

        tracing::trace!(time_remaining = ?entry.time_remaining(), "Cache hit");
        let tags = entry.tags.clone();
        state.touch(image_id);
        Some(tags)
    }

    #[tracing::instrument(skip(self, tags), fields(tags = tags.len()))]
    fn set(&self, image_id: i64, tags: Vec<String>) {
        if !self.config.enabled || self.config.max_size == 0 {
            return;
        }

        let mut state = self.state();
        if state.entries.len() >= self.config.max_size
            && !state.entries.contains_key(&image_id)
            && let Some(lru) = state.access_order.pop_front()
        {
            tracing::debug!(evicted = lru, "Evicting LRU entry");
            state.entries.remove(&lru);
        }

        state.touch(image_id);
        state.entries.insert(
            image_id,
            CacheEntry {
                tags,
                created_at: Instant::now(),
                ttl: Duration::from_secs(self.config.default_ttl),
            },
        );
    }

    fn invalidate(&self, image_id: i64) {
        if self.state().forget(image_id) {
            tracing::trace!(image_id, "Invalidated cache entry");
        }
    }

    fn clear(&self) {
        let mut state = self.state();
        let count = state.entries.len();
        state.entries.clear();
        state.access_order.clear();
        tracing::debug!(cleared = count, "Cleared cache");
    }
}
