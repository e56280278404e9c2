//! Thumbnail output formats.

/// Encoding of a derived thumbnail.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum ThumbnailFormat {
    /// Lossy JPEG, used for JPEG sources and as the fallback
    #[display("jpeg")]
    Jpeg,
    /// Lossless PNG, used for PNG sources
    #[display("png")]
    Png,
}

impl ThumbnailFormat {
    /// Output format for a decoded source format.
    pub fn for_source(source: image::ImageFormat) -> Self {
        match source {
            image::ImageFormat::Png => ThumbnailFormat::Png,
            _ => ThumbnailFormat::Jpeg,
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "jpg",
            ThumbnailFormat::Png => "png",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "image/jpeg",
            ThumbnailFormat::Png => "image/png",
        }
    }
}
