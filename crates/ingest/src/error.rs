//! Error types produced by the ingest crate.
//!
//! Every failure to turn a byte stream into a [`RawImage`](crate::RawImage)
//! surfaces as a [`DecodeError`]. Callers on a live identification path
//! report it back to whoever supplied the scan; the enrollment scan treats it
//! as a per-file skip.
//!
//! | Error | Cause |
//! |-------|-------|
//! | [`EmptyPayload`](DecodeError::EmptyPayload) | zero-length byte stream |
//! | [`PayloadTooLarge`](DecodeError::PayloadTooLarge) | byte stream over `max_payload_bytes` |
//! | [`Malformed`](DecodeError::Malformed) | unknown container or corrupt data |
//! | [`ZeroDimensions`](DecodeError::ZeroDimensions) | width or height is zero |
//! | [`DimensionTooLarge`](DecodeError::DimensionTooLarge) | side over `max_dimension` |
//! | [`LayoutMismatch`](DecodeError::LayoutMismatch) | buffer length disagrees with geometry |
//! | [`Io`](DecodeError::Io) | the file could not be read |
use thiserror::Error;

/// Errors that can occur while acquiring a fingerprint scan.
///
/// ```rust
/// use ingest::DecodeError;
///
/// let err = DecodeError::ZeroDimensions { width: 0, height: 12 };
/// assert_eq!(err.to_string(), "image has zero dimensions (0x12)");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("image payload is empty")]
    EmptyPayload,

    #[error("image payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The byte stream is not a decodable image container.
    #[error("malformed image: {0}")]
    Malformed(String),

    #[error("image has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("image dimensions {width}x{height} exceed limit of {limit} pixels per side")]
    DimensionTooLarge { width: u32, height: u32, limit: u32 },

    #[error("pixel buffer holds {actual} bytes but geometry requires {expected}")]
    LayoutMismatch { expected: usize, actual: usize },

    #[error("failed to read image: {0}")]
    Io(String),

    #[error("invalid ingest configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => DecodeError::Io(io.to_string()),
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_io_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(DecodeError::from(io), DecodeError::Io(msg) if msg.contains("gone")));
    }

    #[test]
    fn display_includes_limits() {
        let err = DecodeError::PayloadTooLarge { size: 10, limit: 4 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("4"));
    }
}
