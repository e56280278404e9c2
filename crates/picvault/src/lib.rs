//! Picvault - content-addressed image catalogue
//!
//! Picvault stores uploaded images as content-addressed blobs, keeps their
//! metadata (directory, tags, size, thumbnail) in a relational store, derives
//! bounded thumbnails, and answers paginated tag intersection queries.
//!
//! # Features
//!
//! - **Deduplication**: identical bytes in one directory are stored and
//!   catalogued once
//! - **Thumbnails**: fit-within-box derivatives, never enlarged
//! - **Tag queries**: images carrying *all* of a set of tags, newest first
//! - **Pluggable stores**: object store, metadata repository and tag cache
//!   are injected
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use picvault::{ImageService, PicvaultConfig, Upload};
//! use picvault_metadata::MemoryMetadataRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PicvaultConfig::load()?;
//!     let service = ImageService::from_config(&config, Arc::new(MemoryMetadataRepository::new()))?;
//!
//!     let bytes = std::fs::read("beach.jpg")?;
//!     let id = service
//!         .save_image(Upload::new("holidays", "beach.jpg", bytes).with_tags(["summer"]))
//!         .await?;
//!     println!("Saved image {}", id);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `database` - PostgreSQL metadata backend and the `picvault` binary
//!
//! # Architecture
//!
//! - `picvault_error` - Error types
//! - `picvault_storage` - Object stores and content-addressed blobs
//! - `picvault_thumbnail` - Thumbnail derivation
//! - `picvault_metadata` - Metadata repository interface, in-memory backend
//! - `picvault_database` - PostgreSQL backend
//! - `picvault_cache` - Tag list cache
//!
//! This crate (`picvault`) holds the coordinator and re-exports the rest.

mod config;
mod service;
mod telemetry;
mod upload;

pub use config::{DatabaseConfig, PicvaultConfig, StorageConfig};
pub use service::ImageService;
pub use telemetry::init_tracing;
pub use upload::{ImageView, Upload};

pub use picvault_cache::{MemoryTagCache, TagCacheConfig, TagListCache};
pub use picvault_error::*;
pub use picvault_metadata::{
    Image, ImagePage, ImageQuery, MemoryMetadataRepository, MetadataRepository,
    MetadataTransaction, Page, Tag,
};
pub use picvault_storage::{
    BlobStore, FileSystemObjectStore, MemoryObjectStore, ObjectInfo, ObjectStore, StoredBlob,
};
pub use picvault_thumbnail::{Thumbnail, ThumbnailConfig, ThumbnailFormat, Thumbnailer};

#[cfg(feature = "database")]
pub use picvault_database::PgMetadataRepository;

use std::time::Duration;

/// Bucket that receives every derived thumbnail unless configured otherwise.
pub const DEFAULT_THUMBNAIL_BUCKET: &str = "tmp-thumbnail";

/// Lifetime of presigned URLs unless configured otherwise.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);
