//! PostgreSQL implementation of MetadataRepository.

use crate::connection::{PgPool, PgPooledConnection, create_pool, run_migrations};
use crate::models::{ImageRow, NewImageRow, NewImageTagRow, NewTagRow, TagRow};
use crate::query;
use crate::schema::{image, image_tag, tag};
use crate::DatabaseResult;
use async_trait::async_trait;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use picvault_error::{DatabaseError, DatabaseErrorKind};
use picvault_metadata::{
    Image, ImagePage, ImageQuery, MetadataRepository, MetadataTransaction, NewImage, Tag,
};
use std::collections::HashMap;

type Tm = AnsiTransactionManager;

/// Metadata repository backed by a PostgreSQL connection pool.
///
/// Each transaction checks a connection out of the pool and holds it until
/// commit or rollback. Uniqueness is enforced by the schema's unique indexes;
/// inserts use `ON CONFLICT DO NOTHING` so a lost race never aborts the
/// surrounding transaction.
///
/// # Example
/// ```no_run
/// use picvault_database::PgMetadataRepository;
/// use picvault_metadata::MetadataRepository;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repo = PgMetadataRepository::connect("postgres://localhost/picvault", 8)?;
///     repo.migrate().await?;
///     let tx = repo.begin().await?;
///     tx.rollback()?;
///     Ok(())
/// }
/// ```
#[derive(Clone, derive_getters::Getters)]
pub struct PgMetadataRepository {
    pool: PgPool,
}

impl std::fmt::Debug for PgMetadataRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgMetadataRepository")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PgMetadataRepository {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool for `database_url` and wrap it.
    pub fn connect(database_url: &str, max_connections: u32) -> DatabaseResult<Self> {
        Ok(Self::new(create_pool(database_url, max_connections)?))
    }

    /// Apply pending schema migrations, returning how many ran.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(&self) -> DatabaseResult<usize> {
        let mut conn = self.checkout().await?;
        tokio::task::spawn_blocking(move || run_migrations(&mut conn))
            .await
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?
    }

    async fn checkout(&self) -> DatabaseResult<PgPooledConnection> {
        let pool = self.pool.clone();
        let conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))??;
        Ok(conn)
    }
}

#[async_trait]
impl MetadataRepository for PgMetadataRepository {
    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> DatabaseResult<Box<dyn MetadataTransaction>> {
        let conn = self.checkout().await?;
        Ok(Box::new(PgTransaction::start(conn)?))
    }
}

/// An open transaction on a pooled connection.
///
/// Rolled back on drop unless committed or rolled back explicitly.
struct PgTransaction {
    conn: PgPooledConnection,
    finished: bool,
}

fn transaction_error(err: diesel::result::Error) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::Transaction(err.to_string()))
}

impl PgTransaction {
    fn start(mut conn: PgPooledConnection) -> DatabaseResult<Self> {
        <Tm as TransactionManager<PgConnection>>::begin_transaction(&mut *conn)
            .map_err(transaction_error)?;
        tracing::trace!("Transaction started");
        Ok(Self {
            conn,
            finished: false,
        })
    }

    fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::debug!("Rolling back abandoned transaction");
        if let Err(e) = <Tm as TransactionManager<PgConnection>>::rollback_transaction(&mut *self.conn) {
            tracing::warn!(error = %e, "Rollback of abandoned transaction failed");
        }
    }
}

impl MetadataTransaction for PgTransaction {
    fn find_image(&mut self, id: i64) -> DatabaseResult<Option<Image>> {
        let row = image::table
            .find(id)
            .select(ImageRow::as_select())
            .first(self.conn())
            .optional()?;
        Ok(row.map(Image::from))
    }

    fn find_image_by_address(
        &mut self,
        directory: &str,
        image_code: &str,
    ) -> DatabaseResult<Option<Image>> {
        let row = image::table
            .filter(image::directory.eq(directory))
            .filter(image::image_code.eq(image_code))
            .select(ImageRow::as_select())
            .first(self.conn())
            .optional()?;
        Ok(row.map(Image::from))
    }

    #[tracing::instrument(skip(self, new_image), fields(directory = %new_image.directory, code = %new_image.image_code))]
    fn create_image(&mut self, new_image: &NewImage) -> DatabaseResult<Image> {
        let inserted = diesel::insert_into(image::table)
            .values(NewImageRow::from(new_image))
            .on_conflict((image::directory, image::image_code))
            .do_nothing()
            .returning(ImageRow::as_returning())
            .get_result(self.conn())
            .optional()?;

        match inserted {
            Some(row) => Ok(row.into()),
            None => Err(DatabaseError::conflict(format!(
                "image {} already exists in {}",
                new_image.image_code, new_image.directory
            ))),
        }
    }

    fn delete_image(&mut self, id: i64) -> DatabaseResult<()> {
        let deleted = diesel::delete(image::table.find(id)).execute(self.conn())?;
        if deleted == 0 {
            return Err(DatabaseError::not_found(format!("image {}", id)));
        }
        Ok(())
    }

    fn thumbnail_in_use(
        &mut self,
        thumbnail_code: &str,
        thumbnail_ext: &str,
    ) -> DatabaseResult<bool> {
        let referenced = diesel::select(diesel::dsl::exists(
            image::table
                .filter(image::thumbnail_code.eq(thumbnail_code))
                .filter(image::thumbnail_ext.eq(thumbnail_ext)),
        ))
        .get_result(self.conn())?;
        Ok(referenced)
    }

    fn find_tag(&mut self, id: i64) -> DatabaseResult<Option<Tag>> {
        let row = tag::table
            .find(id)
            .select(TagRow::as_select())
            .first(self.conn())
            .optional()?;
        Ok(row.map(Tag::from))
    }

    fn find_tag_by_name(&mut self, name: &str) -> DatabaseResult<Option<Tag>> {
        let row = tag::table
            .filter(tag::tag_name.eq(name))
            .select(TagRow::as_select())
            .first(self.conn())
            .optional()?;
        Ok(row.map(Tag::from))
    }

    fn create_tag(&mut self, name: &str) -> DatabaseResult<Tag> {
        let inserted = diesel::insert_into(tag::table)
            .values(NewTagRow { tag_name: name })
            .on_conflict(tag::tag_name)
            .do_nothing()
            .returning(TagRow::as_returning())
            .get_result(self.conn())
            .optional()?;

        inserted
            .map(Tag::from)
            .ok_or_else(|| DatabaseError::conflict(format!("tag {} already exists", name)))
    }

    fn ensure_tag(&mut self, name: &str) -> DatabaseResult<Tag> {
        if let Some(existing) = self.find_tag_by_name(name)? {
            return Ok(existing);
        }

        let inserted = diesel::insert_into(tag::table)
            .values(NewTagRow { tag_name: name })
            .on_conflict(tag::tag_name)
            .do_nothing()
            .returning(TagRow::as_returning())
            .get_result(self.conn())
            .optional()?;

        match inserted {
            Some(row) => Ok(row.into()),
            // A concurrent transaction committed the name first
            None => self
                .find_tag_by_name(name)?
                .ok_or_else(|| DatabaseError::not_found(format!("tag {}", name))),
        }
    }

    fn rename_tag(&mut self, id: i64, name: &str) -> DatabaseResult<Tag> {
        if let Some(other) = self.find_tag_by_name(name)?
            && other.id != id
        {
            return Err(DatabaseError::conflict(format!("tag {} already exists", name)));
        }

        diesel::update(tag::table.find(id))
            .set(tag::tag_name.eq(name))
            .returning(TagRow::as_returning())
            .get_result(self.conn())
            .optional()?
            .map(Tag::from)
            .ok_or_else(|| DatabaseError::not_found(format!("tag {}", id)))
    }

    fn delete_tag(&mut self, id: i64) -> DatabaseResult<()> {
        let deleted = diesel::delete(tag::table.find(id)).execute(self.conn())?;
        if deleted == 0 {
            return Err(DatabaseError::not_found(format!("tag {}", id)));
        }
        Ok(())
    }

    fn list_tags(&mut self) -> DatabaseResult<Vec<Tag>> {
        let rows = tag::table
            .order((tag::created_at.asc(), tag::id.asc()))
            .select(TagRow::as_select())
            .load(self.conn())?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    fn link_image_tag(&mut self, image_id: i64, tag_id: i64) -> DatabaseResult<bool> {
        let inserted = diesel::insert_into(image_tag::table)
            .values(NewImageTagRow { image_id, tag_id })
            .on_conflict((image_tag::image_id, image_tag::tag_id))
            .do_nothing()
            .execute(self.conn())?;
        Ok(inserted == 1)
    }

    fn unlink_image(&mut self, image_id: i64) -> DatabaseResult<usize> {
        Ok(
            diesel::delete(image_tag::table.filter(image_tag::image_id.eq(image_id)))
                .execute(self.conn())?,
        )
    }

    fn unlink_tag(&mut self, tag_id: i64) -> DatabaseResult<usize> {
        Ok(
            diesel::delete(image_tag::table.filter(image_tag::tag_id.eq(tag_id)))
                .execute(self.conn())?,
        )
    }

    fn query_images(&mut self, query: &ImageQuery) -> DatabaseResult<ImagePage> {
        query::query_images(self.conn(), query)
    }

    fn tags_for_images(&mut self, ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<String>>> {
        query::tags_for_images(self.conn(), ids)
    }

    fn commit(mut self: Box<Self>) -> DatabaseResult<()> {
        self.finished = true;
        <Tm as TransactionManager<PgConnection>>::commit_transaction(&mut *self.conn)
            .map_err(transaction_error)?;
        tracing::trace!("Transaction committed");
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> DatabaseResult<()> {
        self.finished = true;
        <Tm as TransactionManager<PgConnection>>::rollback_transaction(&mut *self.conn)
            .map_err(transaction_error)?;
        tracing::trace!("Transaction rolled back");
        Ok(())
    }
}
