//! Identity lookup for matched keys.
//!
//! Profile contents are opaque JSON; this crate only hands over the key and
//! passes back whatever the directory returns.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use index::IdentityKey;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Opaque profile document.
pub type Profile = Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("failed to read profile directory: {0}")]
    Io(String),
    #[error("failed to parse profile directory: {0}")]
    Parse(String),
    #[error("profile directory must be a JSON array of objects")]
    NotAnArray,
}

impl From<std::io::Error> for ProfileError {
    fn from(e: std::io::Error) -> Self {
        ProfileError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        ProfileError::Parse(e.to_string())
    }
}

/// External store of subject profiles keyed by identity.
pub trait ProfileDirectory: Send + Sync {
    /// `Ok(None)` means the key is simply not on file.
    fn lookup(&self, key: IdentityKey) -> Result<Option<Profile>, ProfileError>;
}

/// Profiles loaded from a JSON array of records, each carrying its
/// identity under `nid_no` (string or number).
#[derive(Debug, Clone, Default)]
pub struct JsonProfileDirectory {
    by_key: HashMap<String, Profile>,
}

impl JsonProfileDirectory {
    pub const KEY_FIELD: &'static str = "nid_no";

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Records without a usable `nid_no` are skipped. When a key repeats,
    /// the first record wins.
    pub fn from_json_str(text: &str) -> Result<Self, ProfileError> {
        let Value::Array(items) = serde_json::from_str::<Value>(text)? else {
            return Err(ProfileError::NotAnArray);
        };
        let mut by_key = HashMap::with_capacity(items.len());
        for (pos, item) in items.into_iter().enumerate() {
            let key = match item.get(Self::KEY_FIELD) {
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    warn!(position = pos, "profile_skipped_without_key");
                    continue;
                }
            };
            by_key.entry(key).or_insert(item);
        }
        Ok(Self { by_key })
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl ProfileDirectory for JsonProfileDirectory {
    fn lookup(&self, key: IdentityKey) -> Result<Option<Profile>, ProfileError> {
        Ok(self.by_key.get(&key.to_string()).cloned())
    }
}
