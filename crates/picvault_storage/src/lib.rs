//! Content-addressed blob storage for picvault.
//!
//! This crate wraps an object-storage service behind the [`ObjectStore`]
//! capability trait and layers the [`BlobStore`] adapter on top of it. The
//! adapter owns content addressing (MD5 of the payload plus the original
//! extension) and makes sure a directory's bucket exists before writing.
//!
//! # Features
//!
//! - **Content-addressed keys**: identical bytes land on the same key, so re-uploads are skipped
//! - **Pluggable backends**: in-memory and filesystem stores ship here, S3-style services plug in via the trait
//! - **Signed links**: time-limited retrieval URLs per object
//!
//! # Example
//!
//! ```rust
//! use picvault_storage::{BlobStore, MemoryObjectStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let blobs = BlobStore::new(Arc::new(MemoryObjectStore::new()));
//!
//! let stored = blobs.store("holidays", "beach.png", b"not really a png", "image/png").await?;
//! assert_eq!(stored.key(), &format!("{}.png", stored.code()));
//!
//! let bytes = blobs.fetch("holidays", stored.key()).await?;
//! assert_eq!(bytes, b"not really a png");
//! # Ok(())
//! # }
//! ```

mod blob;
mod filesystem;
mod memory;
mod object_store;

pub use blob::{BlobStore, StoredBlob, content_address, object_key, split_key};
pub use filesystem::FileSystemObjectStore;
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectInfo, ObjectStore};
pub use picvault_error::{StorageError, StorageErrorKind};

/// Result type for blob storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
