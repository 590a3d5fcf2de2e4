//! # NIDPrint template store
//!
//! Holds the enrolled gallery: one texture [`Descriptor`](perceptual::Descriptor)
//! per [`IdentityKey`], built once and then only read.
//!
//! ## Building
//!
//! - [`TemplateStore::build`] walks an [`EnrollmentSource`] (a directory plus
//!   an inclusive key range) and asks a [`TemplateSource`] to turn each
//!   `<key>.<ext>` file into a descriptor. The gallery is allowed to be
//!   sparse: missing and unreadable files are counted in the
//!   [`EnrollmentReport`] and skipped.
//! - [`TemplateStore::from_records`] builds from records already in memory.
//! - [`TemplateStore::load_snapshot`] restores a store written by
//!   [`TemplateStore::save_snapshot`] (bincode, optionally zstd-compressed),
//!   so a restart does not have to re-process every enrollment image.
//!
//! ## Reading
//!
//! [`TemplateStore::get`] is an O(1) lookup; [`TemplateStore::all`] yields
//! records in insertion order, which is the scan order the matcher uses.
//!
//! ```
//! use index::{EnrollmentRecord, IdentityKey, TemplateStore};
//! use perceptual::{Descriptor, DescriptorMeta, TextureConfig};
//!
//! let meta = DescriptorMeta::for_config(&TextureConfig::default());
//! let record = EnrollmentRecord {
//!     key: IdentityKey(5_000_000_001),
//!     descriptor: Descriptor::from_bins(vec![0.5, 0.5], meta).unwrap(),
//! };
//! let store = TemplateStore::from_records(2, vec![record]).unwrap();
//! assert!(store.get(IdentityKey(5_000_000_001)).is_some());
//! ```

mod key;
mod snapshot;
mod source;
mod store;

pub use crate::key::{EnrollmentRecord, IdentityKey};
pub use crate::snapshot::{CompressionCodec, SnapshotConfig, SNAPSHOT_SCHEMA_VERSION};
pub use crate::source::{EnrollmentReport, EnrollmentSource, SourceError, TemplateSource};
pub use crate::store::TemplateStore;

use bincode::error::{DecodeError, EncodeError};
use perceptual::DescriptorMeta;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid key range: first key {first} is after last key {last}")]
    InvalidRange { first: u64, last: u64 },
    #[error("enrollment directory not found: {0}")]
    MissingDirectory(String),
    #[error("duplicate identity key {0}")]
    DuplicateKey(IdentityKey),
    #[error("descriptor length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("unsupported snapshot schema {found}; expected {expected}")]
    UnsupportedSchema { found: u16, expected: u16 },
    #[error("template {key} was extracted as {actual:?}, expected {expected:?}")]
    IncompatibleTemplate {
        key: IdentityKey,
        expected: DescriptorMeta,
        actual: DescriptorMeta,
    },
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}
