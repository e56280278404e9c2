//! PostgreSQL metadata backend for picvault.
//!
//! Implements [`MetadataRepository`](picvault_metadata::MetadataRepository)
//! with Diesel over an r2d2 connection pool. The schema ships as embedded
//! migrations; call [`PgMetadataRepository::migrate`] once at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use picvault_database::PgMetadataRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = PgMetadataRepository::connect(&std::env::var("DATABASE_URL")?, 8)?;
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod models;
mod query;
mod repository;

pub mod schema;

pub use connection::{PgPool, PgPooledConnection, create_pool, run_migrations};
pub use models::{ImageRow, NewImageRow, NewImageTagRow, NewTagRow, TagRow};
pub use repository::PgMetadataRepository;

use picvault_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
