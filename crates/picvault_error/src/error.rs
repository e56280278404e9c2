//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, DatabaseErrorKind, StorageError, ThumbnailError, ValidationError,
};

/// Every failure a picvault operation can surface.
///
/// # Examples
///
/// ```
/// use picvault_error::{PicvaultError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::Unavailable("connection refused".into()));
/// let err: PicvaultError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PicvaultErrorKind {
    /// Malformed caller input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Blob store failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Metadata store failure, including not-found and conflict
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Thumbnail derivation failure
    #[from(ThumbnailError)]
    Thumbnail(ThumbnailError),
}

/// Picvault error with kind discrimination.
///
/// # Examples
///
/// ```
/// use picvault_error::{DatabaseError, PicvaultResult};
///
/// fn lookup() -> PicvaultResult<()> {
///     Err(DatabaseError::not_found("image 42"))?
/// }
///
/// let err = lookup().unwrap_err();
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Picvault Error: {}", _0)]
pub struct PicvaultError(Box<PicvaultErrorKind>);

impl PicvaultError {
    /// Create a new error from a kind.
    pub fn new(kind: PicvaultErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PicvaultErrorKind {
        &self.0
    }

    /// True when a referenced image or tag does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            PicvaultErrorKind::Database(DatabaseError {
                kind: DatabaseErrorKind::NotFound(_),
                ..
            })
        )
    }

    /// True when a uniqueness rule rejected the operation.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self.kind(),
            PicvaultErrorKind::Database(DatabaseError {
                kind: DatabaseErrorKind::Conflict(_),
                ..
            })
        )
    }

    /// True for errors caused by the caller rather than by a backing store.
    pub fn is_client_error(&self) -> bool {
        self.is_not_found()
            || self.is_conflict()
            || matches!(self.kind(), PicvaultErrorKind::Validation(_))
    }
}

// Generic From implementation for any type that converts to PicvaultErrorKind
impl<T> From<T> for PicvaultError
where
    T: Into<PicvaultErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for picvault operations.
pub type PicvaultResult<T> = std::result::Result<T, PicvaultError>;
