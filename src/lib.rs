//! Workspace umbrella crate for NIDPrint fingerprint identification.
//!
//! Wires the stage crates into one pipeline:
//!
//! ```text
//! bytes ──ingest──▶ RawImage ──canonical──▶ NormalizedImage ──perceptual──▶ Descriptor
//!                                                                              │
//!                                   TemplateStore (index) ◀── enrollment ──────┤
//!                                           │                                  │
//!                                           └────────── matcher ◀──── query ───┘
//! ```
//!
//! - [`FingerprintPipeline`] turns a scan into a [`Descriptor`] and doubles as
//!   the [`TemplateSource`] used to enroll a gallery with [`enroll`].
//! - [`IdentificationService`] holds the pipeline, a shared read-only
//!   [`TemplateStore`] and a [`Matcher`], and answers `identify(bytes)`.
//! - Stage errors surface unchanged inside [`PipelineError`]; malformed input
//!   is distinguishable via [`PipelineError::is_decode_failure`].
//! - [`set_pipeline_metrics`] installs an optional observer for per-stage
//!   latency and outcome.

pub mod config;
pub mod profile;
pub mod response;
mod service;

pub use canonical::{BINARY_HIGH, BINARY_LOW, NormalizeConfig, NormalizeError, NormalizedImage, normalize};
pub use index::{
    CompressionCodec, EnrollmentRecord, EnrollmentReport, EnrollmentSource, IdentityKey, IndexError,
    SnapshotConfig, TemplateSource, TemplateStore,
};
pub use ingest::{DecodeError, IngestConfig, PixelLayout, RawImage, decode_image, load_image};
pub use matcher::{Candidate, MatchConfig, MatchError, MatchResult, Matcher, chi_square_distance, match_descriptor};
pub use perceptual::{Descriptor, DescriptorMeta, ExtractionError, TextureConfig, extract};

pub use crate::config::{ConfigLoadError, LoggingConfig, NidprintConfig};
pub use crate::profile::{JsonProfileDirectory, Profile, ProfileDirectory, ProfileError};
pub use crate::response::IdentificationResponse;
pub use crate::service::{IdentificationService, enroll};

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use index::SourceError;

/// Errors that can occur while running a scan through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Decode(DecodeError),
    Normalize(NormalizeError),
    Extraction(ExtractionError),
    Match(MatchError),
    Index(IndexError),
}

impl PipelineError {
    /// True when the input could not be read as an image at all, as opposed
    /// to a valid image that simply did not match.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Decode(_) | PipelineError::Normalize(NormalizeError::Decode(_))
        )
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Decode(err) => write!(f, "decode failure: {err}"),
            PipelineError::Normalize(err) => write!(f, "normalization failure: {err}"),
            PipelineError::Extraction(err) => write!(f, "feature extraction failed: {err}"),
            PipelineError::Match(err) => write!(f, "matching failed: {err}"),
            PipelineError::Index(err) => write!(f, "template store failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Decode(err) => Some(err),
            PipelineError::Normalize(err) => Some(err),
            PipelineError::Extraction(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Index(err) => Some(err),
        }
    }
}

impl From<DecodeError> for PipelineError {
    fn from(value: DecodeError) -> Self {
        PipelineError::Decode(value)
    }
}

impl From<NormalizeError> for PipelineError {
    fn from(value: NormalizeError) -> Self {
        PipelineError::Normalize(value)
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(value: ExtractionError) -> Self {
        PipelineError::Extraction(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_decode(&self, latency: Duration, result: Result<(), DecodeError>);
    fn record_normalize(&self, latency: Duration, result: Result<(), NormalizeError>);
    fn record_extract(&self, latency: Duration, result: Result<(), ExtractionError>);
    fn record_match(&self, latency: Duration, result: Result<MatchResult, MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_decode<T>(self, result: &Result<T, DecodeError>) {
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.recorder.record_decode(self.start.elapsed(), outcome);
    }

    fn record_normalize<T>(self, result: &Result<T, NormalizeError>) {
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.recorder.record_normalize(self.start.elapsed(), outcome);
    }

    fn record_extract<T>(self, result: &Result<T, ExtractionError>) {
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.recorder.record_extract(self.start.elapsed(), outcome);
    }

    pub(crate) fn record_match(self, result: &Result<MatchResult, MatchError>) {
        self.recorder.record_match(self.start.elapsed(), result.clone());
    }
}

/// Scan-to-descriptor pipeline: decode, normalize, extract.
///
/// The same pipeline must be used for enrollment and for queries; its
/// [`TextureConfig`] fixes the descriptor length the gallery is built with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintPipeline {
    pub ingest: IngestConfig,
    pub canonical: NormalizeConfig,
    pub texture: TextureConfig,
}

impl FingerprintPipeline {
    pub fn new(ingest: IngestConfig, canonical: NormalizeConfig, texture: TextureConfig) -> Self {
        Self {
            ingest,
            canonical,
            texture,
        }
    }

    pub fn descriptor_len(&self) -> usize {
        self.texture.descriptor_len()
    }

    /// Metadata every template in a compatible gallery must carry.
    pub fn descriptor_meta(&self) -> DescriptorMeta {
        DescriptorMeta::for_config(&self.texture)
    }

    /// Normalize and extract an already decoded scan.
    pub fn descriptor_from_raw(&self, raw: &RawImage) -> Result<Descriptor, PipelineError> {
        let span = MetricsSpan::start();
        let normalized = normalize(raw, &self.canonical);
        if let Some(span) = span {
            span.record_normalize(&normalized);
        }
        let normalized = normalized?;

        let span = MetricsSpan::start();
        let descriptor = extract(&normalized, &self.texture);
        if let Some(span) = span {
            span.record_extract(&descriptor);
        }
        Ok(descriptor?)
    }

    /// Full pipeline over an encoded scan.
    pub fn descriptor_from_bytes(&self, bytes: &[u8]) -> Result<Descriptor, PipelineError> {
        let span = MetricsSpan::start();
        let raw = decode_image(bytes, &self.ingest);
        if let Some(span) = span {
            span.record_decode(&raw);
        }
        self.descriptor_from_raw(&raw?)
    }

    /// Full pipeline over a scan on disk.
    pub fn descriptor_from_path(&self, path: impl AsRef<Path>) -> Result<Descriptor, PipelineError> {
        let span = MetricsSpan::start();
        let raw = load_image(path, &self.ingest);
        if let Some(span) = span {
            span.record_decode(&raw);
        }
        self.descriptor_from_raw(&raw?)
    }
}

impl TemplateSource for FingerprintPipeline {
    fn load_template(&self, path: &Path) -> Result<Descriptor, SourceError> {
        Ok(self.descriptor_from_path(path)?)
    }
}
