//! Blob storage error types.

/// Kinds of blob storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a bucket
    #[display("Failed to create bucket: {}", _0)]
    BucketCreation(String),
    /// Failed to write an object
    #[display("Failed to write object: {}", _0)]
    ObjectWrite(String),
    /// Failed to read an object
    #[display("Failed to read object: {}", _0)]
    ObjectRead(String),
    /// Failed to delete an object
    #[display("Failed to delete object: {}", _0)]
    ObjectDelete(String),
    /// Object not found at the specified location
    #[display("Object not found: {}", _0)]
    NotFound(String),
    /// Invalid bucket name or object key
    #[display("Invalid object key: {}", _0)]
    InvalidKey(String),
    /// Failed to produce a presigned URL
    #[display("Failed to presign URL: {}", _0)]
    Presign(String),
    /// Invalid storage configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use picvault_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("photos/abc.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
