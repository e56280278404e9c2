//! Catalogue entities.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored image.
///
/// `(directory, image_code)` is unique: the same bytes uploaded twice to one
/// directory resolve to one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    /// Display name, the original upload filename
    pub image_name: String,
    /// Content address of the original, without extension
    pub image_code: String,
    /// Content address of the derived thumbnail, without extension
    pub thumbnail_code: String,
    /// Extension of the thumbnail object, without the dot
    pub thumbnail_ext: String,
    /// Extension of the original object, without the dot
    pub ext: String,
    /// Size of the original in bytes
    pub size: i64,
    /// Directory (bucket) the original lives in
    pub directory: String,
    pub created_at: NaiveDateTime,
}

/// Fields for creating an [`Image`].
#[derive(Debug, Clone, PartialEq, Eq, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewImage {
    pub image_name: String,
    pub image_code: String,
    pub thumbnail_code: String,
    pub thumbnail_ext: String,
    /// Extension of the original, may be empty
    #[builder(default)]
    pub ext: String,
    pub size: i64,
    pub directory: String,
}

/// A tag. Names are unique and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub tag_name: String,
    pub created_at: NaiveDateTime,
}

/// Association between an image and a tag. Each pair appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageTag {
    pub id: i64,
    pub image_id: i64,
    pub tag_id: i64,
    pub created_at: NaiveDateTime,
}
