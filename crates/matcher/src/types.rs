use index::IdentityKey;
use perceptual::DescriptorMeta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Matching policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Configuration schema version.
    pub version: u32,
    /// Acceptance threshold. A candidate is accepted only when its distance
    /// is strictly below this value.
    pub threshold: f64,
    /// Split the gallery scan across rayon workers.
    pub use_parallel: bool,
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.version < 1 {
            return Err(MatchError::InvalidConfig(format!(
                "config version must be >= 1 (got {})",
                self.version
            )));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(MatchError::InvalidConfig(format!(
                "threshold must be finite and > 0 (got {})",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            version: 1,
            threshold: 0.3,
            use_parallel: false,
        }
    }
}

/// Outcome of one identification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchResult {
    Identified { key: IdentityKey, distance: f64 },
    NotIdentified,
}

impl MatchResult {
    pub fn is_identified(&self) -> bool {
        matches!(self, MatchResult::Identified { .. })
    }

    pub fn key(&self) -> Option<IdentityKey> {
        match self {
            MatchResult::Identified { key, .. } => Some(*key),
            MatchResult::NotIdentified => None,
        }
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            MatchResult::Identified { distance, .. } => Some(*distance),
            MatchResult::NotIdentified => None,
        }
    }
}

/// A scored gallery entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub key: IdentityKey,
    pub distance: f64,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    #[error("descriptor length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// `key` is `None` for a query descriptor.
    #[error("incompatible descriptor (key {key:?}): extracted as {actual:?}, expected {expected:?}")]
    IncompatibleTemplate {
        key: Option<IdentityKey>,
        expected: DescriptorMeta,
        actual: DescriptorMeta,
    },
}
