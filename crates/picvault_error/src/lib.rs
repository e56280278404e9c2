//! Error types for picvault.
//!
//! This crate provides the error types shared by every picvault crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use picvault_error::{PicvaultResult, StorageError, StorageErrorKind};
//!
//! fn read_blob() -> PicvaultResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("photos/abc.png".to_string())))?
//! }
//!
//! match read_blob() {
//!     Ok(data) => println!("Got {} bytes", data.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod storage;
mod thumbnail;
mod validation;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{PicvaultError, PicvaultErrorKind, PicvaultResult};
pub use storage::{StorageError, StorageErrorKind};
pub use thumbnail::{ThumbnailError, ThumbnailErrorKind};
pub use validation::ValidationError;
