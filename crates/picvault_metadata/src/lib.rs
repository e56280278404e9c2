//! Metadata repository interface for picvault.
//!
//! This crate defines the catalogue's entities (images, tags and the links
//! between them), the transactional unit of work every backend implements,
//! and the paginated tag-intersection query. An in-memory backend is
//! included; the PostgreSQL backend lives in `picvault_database`.
//!
//! # Example
//!
//! ```rust
//! use picvault_metadata::{ImageQuery, MemoryMetadataRepository, MetadataRepository, NewImageBuilder, Page};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = MemoryMetadataRepository::new();
//!
//! let mut tx = repo.begin().await?;
//! let image = tx.create_image(
//!     &NewImageBuilder::default()
//!         .image_name("beach.png")
//!         .image_code("0cc175b9c0f1b6a831c399e269772661")
//!         .ext("png")
//!         .size(1024)
//!         .directory("holidays")
//!         .thumbnail_code("92eb5ffee6ae2fec3ad71c777531578f")
//!         .thumbnail_ext("png")
//!         .build()?,
//! )?;
//! let tag = tx.ensure_tag("summer")?;
//! tx.link_image_tag(image.id, tag.id)?;
//! tx.commit()?;
//!
//! let mut tx = repo.begin().await?;
//! let page = tx.query_images(&ImageQuery::new("holidays", Page::default()).with_tags(["summer"]))?;
//! tx.rollback()?;
//! assert_eq!(page.total, 1);
//! # Ok(())
//! # }
//! ```

mod memory;
mod models;
mod query;
mod repository;

pub use memory::MemoryMetadataRepository;
pub use models::{Image, ImageTag, NewImage, NewImageBuilder, NewImageBuilderError, Tag};
pub use query::{ImagePage, ImageQuery, Page};
pub use repository::{MetadataRepository, MetadataTransaction};

pub use picvault_error::{DatabaseError, DatabaseErrorKind};

/// Result type for metadata operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
