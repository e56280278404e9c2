//! Thumbnail derivation error types.

/// Thumbnail derivation failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ThumbnailErrorKind {
    /// Source bytes are not a decodable image
    #[display("Failed to decode image: {}", _0)]
    Decode(String),
    /// Re-encoding the resized image failed
    #[display("Failed to encode thumbnail: {}", _0)]
    Encode(String),
    /// Bounding box has a zero dimension
    #[display("Invalid thumbnail bounds {}x{}", width, height)]
    InvalidBounds {
        /// Requested maximum width
        width: u32,
        /// Requested maximum height
        height: u32,
    },
    /// The blocking derivation task did not complete
    #[display("Thumbnail task failed: {}", _0)]
    Task(String),
}

/// Thumbnail error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Thumbnail Error: {} at line {} in {}", kind, line, file)]
pub struct ThumbnailError {
    /// The kind of error that occurred
    pub kind: ThumbnailErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ThumbnailError {
    /// Create a new thumbnail error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ThumbnailErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
