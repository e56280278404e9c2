//! Diesel row models for the catalogue tables.

use crate::schema::{image, image_tag, tag};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use picvault_metadata::{Image, NewImage, Tag};

/// Database row for the image table.
///
/// Also loadable by name so raw intersection queries can return it.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Identifiable)]
#[diesel(table_name = image)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    pub id: i64,
    pub image_name: String,
    pub image_code: String,
    pub thumbnail_code: String,
    pub thumbnail_ext: String,
    pub ext: String,
    pub size: i64,
    pub directory: String,
    pub created_at: NaiveDateTime,
}

/// Insertable image row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = image)]
pub struct NewImageRow<'a> {
    pub image_name: &'a str,
    pub image_code: &'a str,
    pub thumbnail_code: &'a str,
    pub thumbnail_ext: &'a str,
    pub ext: &'a str,
    pub size: i64,
    pub directory: &'a str,
}

/// Database row for the tag table.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tag)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TagRow {
    pub id: i64,
    pub tag_name: String,
    pub created_at: NaiveDateTime,
}

/// Insertable tag row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tag)]
pub struct NewTagRow<'a> {
    pub tag_name: &'a str,
}

/// Insertable image_tag row.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = image_tag)]
pub struct NewImageTagRow {
    pub image_id: i64,
    pub tag_id: i64,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            image_name: row.image_name,
            image_code: row.image_code,
            thumbnail_code: row.thumbnail_code,
            thumbnail_ext: row.thumbnail_ext,
            ext: row.ext,
            size: row.size,
            directory: row.directory,
            created_at: row.created_at,
        }
    }
}

impl<'a> From<&'a NewImage> for NewImageRow<'a> {
    fn from(new_image: &'a NewImage) -> Self {
        NewImageRow {
            image_name: &new_image.image_name,
            image_code: &new_image.image_code,
            thumbnail_code: &new_image.thumbnail_code,
            thumbnail_ext: &new_image.thumbnail_ext,
            ext: &new_image.ext,
            size: new_image.size,
            directory: &new_image.directory,
        }
    }
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            tag_name: row.tag_name,
            created_at: row.created_at,
        }
    }
}
