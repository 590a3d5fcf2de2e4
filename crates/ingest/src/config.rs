//! Configuration for image acquisition.
//!
//! [`IngestConfig`] bounds what the decoder is willing to accept. It is cheap
//! to clone and deserializes from the `ingest` section of the service YAML.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("defaults are valid");
//! assert_eq!(config.max_dimension, 8192);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Runtime limits applied before and after decoding a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Configuration schema version; must be >= 1.
    pub version: u32,
    /// Largest encoded byte stream accepted, in bytes.
    pub max_payload_bytes: usize,
    /// Largest accepted width or height, in pixels.
    pub max_dimension: u32,
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    pub fn with_max_dimension(mut self, pixels: u32) -> Self {
        self.max_dimension = pixels;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.version == 0 {
            return Err(DecodeError::InvalidConfig(
                "version must be >= 1".into(),
            ));
        }
        if self.max_payload_bytes == 0 {
            return Err(DecodeError::InvalidConfig(
                "max_payload_bytes must be greater than zero".into(),
            ));
        }
        if self.max_dimension == 0 {
            return Err(DecodeError::InvalidConfig(
                "max_dimension must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_payload_bytes: 16 * 1024 * 1024,
            max_dimension: 8192,
        }
    }
}
