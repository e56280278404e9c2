//! Thumbnail derivation for picvault.
//!
//! Decodes an uploaded image, fits it inside a bounding box while keeping its
//! aspect ratio, and re-encodes it. JPEG and PNG sources keep their format;
//! every other decodable format is re-encoded as JPEG.
//!
//! # Example
//!
//! ```rust
//! use picvault_thumbnail::{ThumbnailConfig, ThumbnailFormat, Thumbnailer};
//! use image::{ImageFormat, RgbImage};
//! use std::io::Cursor;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut png = Cursor::new(Vec::new());
//! RgbImage::new(1200, 300).write_to(&mut png, ImageFormat::Png)?;
//!
//! let thumbnailer = Thumbnailer::new(ThumbnailConfig::default());
//! let thumbnail = thumbnailer.derive(png.get_ref())?;
//!
//! assert_eq!(thumbnail.format(), &ThumbnailFormat::Png);
//! assert_eq!((*thumbnail.width(), *thumbnail.height()), (600, 150));
//! # Ok(())
//! # }
//! ```

mod format;
mod thumbnailer;

pub use format::ThumbnailFormat;
pub use picvault_error::{ThumbnailError, ThumbnailErrorKind};
pub use thumbnailer::{Thumbnail, ThumbnailConfig, Thumbnailer, derive_thumbnail};

/// Result type for thumbnail derivation.
pub type ThumbnailResult<T> = Result<T, ThumbnailError>;
