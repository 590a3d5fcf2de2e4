use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use index::{EnrollmentReport, EnrollmentSource, TemplateStore};
use matcher::{Candidate, MatchConfig, MatchResult, Matcher};
use perceptual::Descriptor;
use tracing::{info, warn};

use crate::profile::ProfileDirectory;
use crate::response::IdentificationResponse;
use crate::{FingerprintPipeline, MetricsSpan, PipelineError};

/// Build a gallery by running every enrollment image through `pipeline`.
///
/// Missing or unreadable images are skipped and counted in the report.
pub fn enroll(
    pipeline: &FingerprintPipeline,
    source: &EnrollmentSource,
) -> Result<(TemplateStore, EnrollmentReport), PipelineError> {
    let start = Instant::now();
    let (store, report) = TemplateStore::build(source, pipeline.descriptor_len(), pipeline)?;
    info!(
        loaded = report.loaded,
        missing = report.missing,
        rejected = report.rejected,
        directory = %source.directory.display(),
        elapsed_micros = start.elapsed().as_micros(),
        "enroll_complete"
    );
    Ok((store, report))
}

/// Request-time identification over a fixed gallery.
///
/// Cheap to share: the gallery sits behind an `Arc` and is never mutated,
/// so concurrent `identify` calls need no locking.
#[derive(Debug, Clone)]
pub struct IdentificationService {
    pipeline: FingerprintPipeline,
    matcher: Matcher,
}

impl IdentificationService {
    /// Fails if `cfg` is invalid or the gallery was built with a different
    /// descriptor length than `pipeline` produces.
    pub fn new(
        pipeline: FingerprintPipeline,
        store: Arc<TemplateStore>,
        cfg: MatchConfig,
    ) -> Result<Self, PipelineError> {
        let matcher = Matcher::new(store, &pipeline.texture, cfg)?;
        Ok(Self { pipeline, matcher })
    }

    pub fn pipeline(&self) -> &FingerprintPipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<TemplateStore> {
        self.matcher.store()
    }

    pub fn match_config(&self) -> &MatchConfig {
        self.matcher.config()
    }

    /// Identify an encoded scan.
    pub fn identify(&self, bytes: &[u8]) -> Result<MatchResult, PipelineError> {
        let descriptor = self.pipeline.descriptor_from_bytes(bytes).inspect_err(|err| {
            warn!(error = %err, decode_failure = err.is_decode_failure(), "identify_rejected");
        })?;
        self.identify_descriptor(&descriptor)
    }

    /// Identify a scan on disk.
    pub fn identify_path(&self, path: impl AsRef<Path>) -> Result<MatchResult, PipelineError> {
        let descriptor = self.pipeline.descriptor_from_path(path).inspect_err(|err| {
            warn!(error = %err, decode_failure = err.is_decode_failure(), "identify_rejected");
        })?;
        self.identify_descriptor(&descriptor)
    }

    /// Identify a descriptor that was already extracted with this pipeline.
    pub fn identify_descriptor(&self, descriptor: &Descriptor) -> Result<MatchResult, PipelineError> {
        let span = MetricsSpan::start();
        let result = self.matcher.identify(descriptor);
        if let Some(span) = span {
            span.record_match(&result);
        }
        let result = result?;
        info!(
            identified = result.is_identified(),
            identity_key = result.key().map(|k| k.get()),
            distance = result.distance(),
            gallery = self.store().len(),
            "identify_result"
        );
        Ok(result)
    }

    /// The `k` nearest gallery entries for an encoded scan, ignoring the
    /// acceptance threshold.
    pub fn candidates(&self, bytes: &[u8], k: usize) -> Result<Vec<Candidate>, PipelineError> {
        let descriptor = self.pipeline.descriptor_from_bytes(bytes)?;
        Ok(self.matcher.candidates(&descriptor, k)?)
    }

    /// Identify and shape the caller-facing response, attaching the profile
    /// from `profiles` when a match is found.
    ///
    /// A failed profile lookup is logged and leaves `profile` empty; the
    /// identification itself still stands.
    pub fn respond(
        &self,
        bytes: &[u8],
        profiles: Option<&dyn ProfileDirectory>,
    ) -> Result<IdentificationResponse, PipelineError> {
        let result = self.identify(bytes)?;
        let mut response = IdentificationResponse::from(result);
        if let (Some(key), Some(directory)) = (result.key(), profiles) {
            match directory.lookup(key) {
                Ok(profile) => response.profile = profile,
                Err(err) => warn!(identity_key = key.get(), error = %err, "profile_lookup_failed"),
            }
        }
        Ok(response)
    }
}
