//! Listing queries and pagination.

use crate::Image;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Page {
    page: i64,
    page_size: i64,
}

impl Page {
    /// Page size used when none (or a non-positive one) is given.
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    /// Create a page, replacing a non-positive page with 1 and a
    /// non-positive page size with [`Page::DEFAULT_PAGE_SIZE`].
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: if page <= 0 { 1 } else { page },
            page_size: if page_size <= 0 {
                Self::DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Rows to return.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// Images in a directory, optionally restricted to those carrying every tag
/// in a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ImageQuery {
    directory: String,
    /// Required tag names, de-duplicated and sorted
    tags: Vec<String>,
    page: Page,
}

impl ImageQuery {
    /// All images in `directory`.
    pub fn new(directory: impl Into<String>, page: Page) -> Self {
        Self {
            directory: directory.into(),
            tags: Vec::new(),
            page,
        }
    }

    /// Require every one of `tags`. Order and repetition do not matter.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.tags = tags.into_iter().collect();
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePage {
    /// Images on this page, newest first
    pub images: Vec<Image>,
    /// Number of qualifying images across all pages
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(Page::new(0, 0), Page::new(1, 10));
        assert_eq!(Page::new(-3, -1), Page::default());
        assert_eq!(*Page::new(4, 25).page_size(), 25);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(Page::new(1, 10).offset(), 0);
        assert_eq!(Page::new(2, 10).offset(), 10);
        assert_eq!(Page::new(3, 7).offset(), 14);
        assert_eq!(Page::new(3, 7).limit(), 7);
    }

    #[test]
    fn test_query_tags_are_a_set() {
        let query = ImageQuery::new("d", Page::default()).with_tags(["b", "a", "b"]);
        assert_eq!(query.tags(), &vec!["a".to_string(), "b".to_string()]);
    }
}
