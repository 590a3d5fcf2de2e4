//! Where enrollment templates come from.

use std::error::Error;
use std::path::{Path, PathBuf};

use perceptual::Descriptor;
use serde::{Deserialize, Serialize};

use crate::key::IdentityKey;
use crate::IndexError;

/// Error type returned by a [`TemplateSource`]. Any failure is treated as a
/// per-file skip during enrollment.
pub type SourceError = Box<dyn Error + Send + Sync>;

/// Produces a descriptor from an enrollment image on disk.
///
/// The store has no opinion on decoding or feature extraction; the caller
/// plugs its image pipeline in here.
pub trait TemplateSource: Send + Sync {
    fn load_template(&self, path: &Path) -> Result<Descriptor, SourceError>;
}

impl<F> TemplateSource for F
where
    F: Fn(&Path) -> Result<Descriptor, SourceError> + Send + Sync,
{
    fn load_template(&self, path: &Path) -> Result<Descriptor, SourceError> {
        self(path)
    }
}

/// Directory of enrollment images named `<key>.<extension>` over an
/// inclusive key range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentSource {
    pub directory: PathBuf,
    pub first_key: u64,
    /// Inclusive.
    pub last_key: u64,
    /// File extension without the dot. Empty means the bare key.
    pub extension: String,
}

impl EnrollmentSource {
    pub fn new(directory: impl Into<PathBuf>, first_key: u64, last_key: u64) -> Self {
        Self {
            directory: directory.into(),
            first_key,
            last_key,
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.first_key > self.last_key {
            return Err(IndexError::InvalidRange {
                first: self.first_key,
                last: self.last_key,
            });
        }
        Ok(())
    }

    /// Keys in scan order.
    pub fn keys(&self) -> impl Iterator<Item = IdentityKey> {
        (self.first_key..=self.last_key).map(IdentityKey)
    }

    /// Number of keys in the range.
    pub fn span(&self) -> u64 {
        self.last_key
            .checked_sub(self.first_key)
            .map_or(0, |d| d.saturating_add(1))
    }

    pub fn path_for(&self, key: IdentityKey) -> PathBuf {
        let name = if self.extension.is_empty() {
            key.to_string()
        } else {
            format!("{key}.{}", self.extension)
        };
        self.directory.join(name)
    }
}

impl Default for EnrollmentSource {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("fingerprints_raw"),
            first_key: 5_000_000_001,
            last_key: 5_000_000_150,
            extension: "bmp".to_string(),
        }
    }
}

/// Outcome counts of one enrollment scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentReport {
    /// Templates inserted into the store.
    pub loaded: usize,
    /// Keys with no file on disk.
    pub missing: usize,
    /// Files that failed to load or produced the wrong descriptor length.
    pub rejected: usize,
}

impl EnrollmentReport {
    pub fn scanned(&self) -> usize {
        self.loaded + self.missing + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_covers_reference_gallery() {
        let src = EnrollmentSource::default();
        assert_eq!(src.span(), 150);
        assert_eq!(
            src.path_for(IdentityKey(5_000_000_001)),
            PathBuf::from("fingerprints_raw/5000000001.bmp")
        );
        assert!(src.validate().is_ok());
    }

    #[test]
    fn keys_are_inclusive_and_ordered() {
        let src = EnrollmentSource::new("d", 1, 3);
        let keys: Vec<u64> = src.keys().map(IdentityKey::get).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(EnrollmentSource::new("d", 7, 7).span(), 1);
    }

    #[test]
    fn reversed_range_is_invalid() {
        let src = EnrollmentSource::new("d", 5, 4);
        assert_eq!(
            src.validate(),
            Err(IndexError::InvalidRange { first: 5, last: 4 })
        );
        assert_eq!(src.span(), 0);
    }

    #[test]
    fn empty_extension_uses_bare_key() {
        let src = EnrollmentSource::new("scans", 1, 1).with_extension("");
        assert_eq!(src.path_for(IdentityKey(9)), PathBuf::from("scans/9"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let src: EnrollmentSource = serde_json::from_str(r#"{"first_key": 1, "last_key": 2}"#).unwrap();
        assert_eq!(src.extension, "bmp");
        assert_eq!(src.directory, PathBuf::from("fingerprints_raw"));
    }

    #[test]
    fn report_counts_scanned_keys() {
        let r = EnrollmentReport {
            loaded: 2,
            missing: 1,
            rejected: 1,
        };
        assert_eq!(r.scanned(), 4);
    }
}
