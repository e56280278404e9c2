//! Coordinator inputs and outputs.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// An image to save.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Upload {
    directory: String,
    filename: String,
    content_type: String,
    data: Vec<u8>,
    tags: Vec<String>,
}

impl Upload {
    /// Upload `data` as `filename` into `directory`, untagged.
    pub fn new(directory: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            content_type: "application/octet-stream".to_string(),
            data,
            tags: Vec::new(),
        }
    }

    /// Content type recorded on the stored original.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Tags to attach, in order. Names are used verbatim.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn into_parts(self) -> (String, String, String, Vec<u8>, Vec<String>) {
        (
            self.directory,
            self.filename,
            self.content_type,
            self.data,
            self.tags,
        )
    }
}

/// An image as presented to callers, with retrieval URLs and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageView {
    pub id: i64,
    pub name: String,
    pub directory: String,
    pub ext: String,
    pub size: i64,
    pub created_at: NaiveDateTime,
    /// Presigned URL of the original
    pub url: String,
    /// Presigned URL of the thumbnail
    pub thumbnail_url: String,
    pub tags: Vec<String>,
}
