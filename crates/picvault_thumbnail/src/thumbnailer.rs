//! Decode, fit and re-encode.

use crate::{ThumbnailError, ThumbnailErrorKind, ThumbnailFormat, ThumbnailResult};
use derive_getters::Getters;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Bounding box and encoder settings for thumbnails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ThumbnailConfig {
    /// Maximum thumbnail width in pixels
    #[serde(default = "default_max_dimension")]
    max_width: u32,

    /// Maximum thumbnail height in pixels
    #[serde(default = "default_max_dimension")]
    max_height: u32,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    jpeg_quality: u8,
}

fn default_max_dimension() -> u32 {
    600
}

fn default_jpeg_quality() -> u8 {
    85
}

impl ThumbnailConfig {
    /// Bounding box with the default JPEG quality.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            jpeg_quality: default_jpeg_quality(),
        }
    }

    /// Override the JPEG quality, clamped to 1-100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self::new(default_max_dimension(), default_max_dimension())
    }
}

/// An encoded thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Thumbnail {
    /// Encoded bytes
    data: Vec<u8>,
    /// Encoding of `data`
    format: ThumbnailFormat,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
}

impl Thumbnail {
    /// Take the encoded bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Derives thumbnails according to a [`ThumbnailConfig`].
#[derive(Debug, Clone, Default)]
pub struct Thumbnailer {
    config: ThumbnailConfig,
}

impl Thumbnailer {
    /// Create a thumbnailer.
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Derive a thumbnail from encoded image bytes.
    ///
    /// The source format is sniffed from the content. The image is scaled
    /// down to fit the bounding box with its aspect ratio kept; images that
    /// already fit are re-encoded at their own size, never enlarged.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailErrorKind::InvalidBounds`] if a bound is zero
    /// - [`ThumbnailErrorKind::Decode`] if the bytes are not a supported image
    /// - [`ThumbnailErrorKind::Encode`] if re-encoding fails
    #[tracing::instrument(skip(self, source), fields(source_size = source.len(), max_width = self.config.max_width, max_height = self.config.max_height))]
    pub fn derive(&self, source: &[u8]) -> ThumbnailResult<Thumbnail> {
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);
        if max_width == 0 || max_height == 0 {
            return Err(ThumbnailError::new(ThumbnailErrorKind::InvalidBounds {
                width: max_width,
                height: max_height,
            }));
        }

        let source_format = image::guess_format(source)
            .map_err(|e| ThumbnailError::new(ThumbnailErrorKind::Decode(e.to_string())))?;
        let decoded = image::load_from_memory_with_format(source, source_format)
            .map_err(|e| ThumbnailError::new(ThumbnailErrorKind::Decode(e.to_string())))?;

        let (source_width, source_height) = (decoded.width(), decoded.height());
        let fitted = if source_width <= max_width && source_height <= max_height {
            decoded
        } else {
            decoded.resize(max_width, max_height, FilterType::Lanczos3)
        };

        let format = ThumbnailFormat::for_source(source_format);
        let data = encode(&fitted, format, self.config.jpeg_quality)?;

        tracing::debug!(
            source_format = ?source_format,
            source_width,
            source_height,
            width = fitted.width(),
            height = fitted.height(),
            format = %format,
            size = data.len(),
            "Derived thumbnail"
        );

        Ok(Thumbnail {
            data,
            format,
            width: fitted.width(),
            height: fitted.height(),
        })
    }
}

fn encode(img: &DynamicImage, format: ThumbnailFormat, jpeg_quality: u8) -> ThumbnailResult<Vec<u8>> {
    let mut data = Vec::new();
    let result = match format {
        // JPEG has no alpha channel
        ThumbnailFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut data, jpeg_quality)),
        ThumbnailFormat::Png => img.write_with_encoder(PngEncoder::new(&mut data)),
    };
    result.map_err(|e| ThumbnailError::new(ThumbnailErrorKind::Encode(e.to_string())))?;
    Ok(data)
}

/// Derive a thumbnail bounded by `max_width` x `max_height` with default encoder settings.
pub fn derive_thumbnail(source: &[u8], max_width: u32, max_height: u32) -> ThumbnailResult<Thumbnail> {
    Thumbnailer::new(ThumbnailConfig::new(max_width, max_height)).derive(source)
}
