//! Per-image tag list caching with TTL support.
//!
//! Listing pages look up the tags of every image they show. This crate
//! provides the [`TagListCache`] interface the catalogue consults before
//! hitting the metadata store, and an in-process implementation.

#![warn(missing_docs)]

mod cache;

pub use cache::{CacheEntry, MemoryTagCache, TagCacheConfig, TagCacheConfigBuilder, TagListCache};
