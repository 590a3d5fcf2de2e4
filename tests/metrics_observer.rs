//! Installs the process-wide metrics recorder, so it lives in its own test binary.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{bmp, whorl};
use nidprint::{
    DecodeError, ExtractionError, FingerprintPipeline, IdentificationService, MatchConfig,
    MatchError, MatchResult, NormalizeError, PipelineMetrics, TemplateStore, set_pipeline_metrics,
};

#[derive(Default)]
struct RecordingMetrics {
    events: Mutex<Vec<String>>,
}

impl RecordingMetrics {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl PipelineMetrics for RecordingMetrics {
    fn record_decode(&self, _latency: Duration, result: Result<(), DecodeError>) {
        self.push(format!("decode:{}", result.is_ok()));
    }

    fn record_normalize(&self, _latency: Duration, result: Result<(), NormalizeError>) {
        self.push(format!("normalize:{}", result.is_ok()));
    }

    fn record_extract(&self, _latency: Duration, result: Result<(), ExtractionError>) {
        self.push(format!("extract:{}", result.is_ok()));
    }

    fn record_match(&self, _latency: Duration, result: Result<MatchResult, MatchError>) {
        let outcome = match result {
            Ok(r) if r.is_identified() => "identified",
            Ok(_) => "not_identified",
            Err(_) => "error",
        };
        self.push(format!("match:{outcome}"));
    }
}

#[test]
fn recorder_sees_every_stage() {
    let metrics = Arc::new(RecordingMetrics::default());
    set_pipeline_metrics(Some(metrics.clone()));

    let pipeline = FingerprintPipeline::default();
    let store = TemplateStore::from_records(pipeline.descriptor_len(), Vec::new()).unwrap();
    let service =
        IdentificationService::new(pipeline, Arc::new(store), MatchConfig::default()).unwrap();

    service.identify(&bmp(&whorl(9.0))).unwrap();
    assert_eq!(
        metrics.take(),
        vec![
            "decode:true",
            "normalize:true",
            "extract:true",
            "match:not_identified"
        ]
    );

    service.identify(b"junk").unwrap_err();
    assert_eq!(metrics.take(), vec!["decode:false"]);

    set_pipeline_metrics(None);
    service.identify(&bmp(&whorl(9.0))).unwrap();
    assert!(metrics.take().is_empty());
}
