use ingest::DecodeError;
use thiserror::Error;

/// Errors that can occur during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("pixel {index} has value {value}, not a binary level")]
    NonBinaryPixel { index: usize, value: u8 },
    /// The input could not be interpreted as a usable image.
    #[error("cannot normalize image: {0}")]
    Decode(#[from] DecodeError),
}
