//! Metadata store error types.

/// Metadata store error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Connection or pool checkout failed
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Database query error: {}", _0)]
    Query(String),
    /// Begin, commit or rollback failed
    #[display("Transaction error: {}", _0)]
    Transaction(String),
    /// Migration error
    #[display("Migration error: {}", _0)]
    Migration(String),
    /// Referenced record is absent
    #[display("Record not found: {}", _0)]
    NotFound(String),
    /// A uniqueness rule would be violated
    #[display("Conflict: {}", _0)]
    Conflict(String),
}

/// Database error with source location tracking.
///
/// # Examples
///
/// ```
/// use picvault_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::NotFound("image 7".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a [`DatabaseErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::NotFound(what.into()))
    }

    /// Shorthand for a [`DatabaseErrorKind::Conflict`] error.
    #[track_caller]
    pub fn conflict(what: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::Conflict(what.into()))
    }
}

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind as DieselKind, Error};

        match err {
            Error::NotFound => DatabaseError::not_found("record"),
            Error::DatabaseError(DieselKind::UniqueViolation, info) => {
                DatabaseError::conflict(info.message().to_string())
            }
            Error::DatabaseError(DieselKind::ForeignKeyViolation, info) => {
                DatabaseError::not_found(info.message().to_string())
            }
            Error::RollbackTransaction | Error::AlreadyInTransaction | Error::NotInTransaction => {
                DatabaseError::new(DatabaseErrorKind::Transaction(err.to_string()))
            }
            _ => DatabaseError::new(DatabaseErrorKind::Query(err.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::r2d2::PoolError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::r2d2::PoolError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}
