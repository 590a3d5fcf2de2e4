//! YAML configuration for the identification service.
//!
//! Every stage section is optional and falls back to its defaults, so a file
//! holding only `version: "1.0"` is a valid configuration.
//!
//! ```yaml
//! version: "1.0"
//! name: "district office"
//!
//! ingest:
//!   max_payload_bytes: 16777216
//!   max_dimension: 4096
//!
//! canonical:
//!   tile_grid: 8
//!   clip_limit: 2.0
//!   denoise_strength: 30.0
//!   template_window: 7
//!   search_window: 21
//!
//! perceptual:
//!   radius: 3
//!   points: 24
//!   epsilon: 1.0e-7
//!
//! enrollment:
//!   directory: "fingerprints_raw"
//!   first_key: 5000000001
//!   last_key: 5000000150
//!   extension: "bmp"
//!
//! matcher:
//!   threshold: 0.3
//!   use_parallel: true
//!
//! snapshot:
//!   codec: "zstd"
//!   level: 3
//!
//! profiles: "citizens.json"
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use canonical::NormalizeConfig;
use index::{CompressionCodec, EnrollmentSource, SnapshotConfig};
use ingest::IngestConfig;
use matcher::MatchConfig;
use perceptual::TextureConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FingerprintPipeline;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NidprintConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub canonical: NormalizeConfig,

    #[serde(default)]
    pub perceptual: TextureConfig,

    #[serde(default)]
    pub enrollment: EnrollmentSource,

    #[serde(default)]
    pub matcher: MatchConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// JSON array of subject profiles attached to positive identifications.
    #[serde(default)]
    pub profiles: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NidprintConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: NidprintConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest.validate().map_err(|e| invalid("ingest", e))?;
        self.canonical.validate().map_err(|e| invalid("canonical", e))?;
        self.perceptual
            .validate()
            .map_err(|e| invalid("perceptual", e))?;
        self.enrollment
            .validate()
            .map_err(|e| invalid("enrollment", e))?;
        self.matcher.validate().map_err(|e| invalid("matcher", e))?;

        if self.snapshot.codec == CompressionCodec::Zstd && !(1..=22).contains(&self.snapshot.level)
        {
            return Err(ConfigLoadError::Validation(format!(
                "snapshot.level must be within 1..=22 (got {})",
                self.snapshot.level
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Pipeline assembled from the ingest, canonical and perceptual sections.
    pub fn pipeline(&self) -> FingerprintPipeline {
        FingerprintPipeline::new(
            self.ingest.clone(),
            self.canonical.clone(),
            self.perceptual.clone(),
        )
    }
}

impl Default for NidprintConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            ingest: IngestConfig::default(),
            canonical: NormalizeConfig::default(),
            perceptual: TextureConfig::default(),
            enrollment: EnrollmentSource::default(),
            matcher: MatchConfig::default(),
            snapshot: SnapshotConfig::default(),
            profiles: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// `tracing` subscriber settings; `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn invalid(section: &str, err: impl std::fmt::Display) -> ConfigLoadError {
    ConfigLoadError::Validation(format!("{section}: {err}"))
}
