use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use index::{EnrollmentRecord, TemplateStore};
use perceptual::{Descriptor, DescriptorMeta, TextureConfig};
use rayon::prelude::*;
use tracing::debug;

use crate::distance::chi_square_distance;
use crate::types::{Candidate, MatchConfig, MatchError, MatchResult};


/// Best entry seen so far: distance and scan position.
type Best = (f64, usize);

/// Orders by distance, then by scan position, so equal distances resolve to
/// the earliest entry.
fn earlier_or_closer(a: Best, b: Best) -> Best {
    match b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)) {
        Ordering::Less => b,
        _ => a,
    }
}

fn scan_sequential(query: &[f64], records: &[EnrollmentRecord]) -> Option<Best> {
    let mut best: Option<Best> = None;
    for (pos, record) in records.iter().enumerate() {
        let distance = chi_square_distance(query, record.descriptor.as_slice());
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, pos));
        }
    }
    best
}

fn scan_parallel(query: &[f64], records: &[EnrollmentRecord]) -> Option<Best> {
    records
        .par_iter()
        .enumerate()
        .map(|(pos, record)| (chi_square_distance(query, record.descriptor.as_slice()), pos))
        .reduce_with(earlier_or_closer)
}

fn decide(best: Option<Best>, records: &[EnrollmentRecord], threshold: f64) -> MatchResult {
    match best {
        Some((distance, pos)) if distance < threshold => MatchResult::Identified {
            key: records[pos].key,
            distance,
        },
        _ => MatchResult::NotIdentified,
    }
}

/// Exhaustive nearest-neighbour search of `query` over `store`.
///
/// Returns the closest entry if its distance is strictly below `threshold`.
/// On equal distances the entry earliest in scan order wins. An empty store
/// never identifies. A query whose length differs from the store's is an
/// error rather than a truncated comparison.
pub fn match_descriptor(
    query: &Descriptor,
    store: &TemplateStore,
    threshold: f64,
) -> Result<MatchResult, MatchError> {
    if query.len() != store.descriptor_len() {
        return Err(MatchError::DimensionMismatch {
            expected: store.descriptor_len(),
            actual: query.len(),
        });
    }
    let records = store.records();
    Ok(decide(scan_sequential(query.as_slice(), records), records, threshold))
}

/// Matcher bound to one gallery and one descriptor geometry.
///
/// Every enrolled template must carry the [`DescriptorMeta`] of the texture
/// configuration the matcher is built with, and so must every query. A
/// gallery extracted with another radius, point count or algorithm version
/// is refused even when its histograms happen to have the same length.
#[derive(Debug, Clone)]
pub struct Matcher {
    store: Arc<TemplateStore>,
    cfg: MatchConfig,
    descriptor_len: usize,
    meta: DescriptorMeta,
}

impl Matcher {
    pub fn new(
        store: Arc<TemplateStore>,
        texture: &TextureConfig,
        cfg: MatchConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        texture
            .validate()
            .map_err(|e| MatchError::InvalidConfig(e.to_string()))?;
        let descriptor_len = texture.descriptor_len();
        if store.descriptor_len() != descriptor_len {
            return Err(MatchError::DimensionMismatch {
                expected: descriptor_len,
                actual: store.descriptor_len(),
            });
        }
        let meta = DescriptorMeta::for_config(texture);
        if let Some(record) = store.all().find(|r| r.descriptor.meta() != &meta) {
            return Err(MatchError::IncompatibleTemplate {
                key: Some(record.key),
                expected: meta,
                actual: record.descriptor.meta().clone(),
            });
        }
        Ok(Self {
            store,
            cfg,
            descriptor_len,
            meta,
        })
    }

    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    fn check_query(&self, query: &Descriptor) -> Result<(), MatchError> {
        if query.len() != self.descriptor_len {
            return Err(MatchError::DimensionMismatch {
                expected: self.descriptor_len,
                actual: query.len(),
            });
        }
        if query.meta() != &self.meta {
            return Err(MatchError::IncompatibleTemplate {
                key: None,
                expected: self.meta.clone(),
                actual: query.meta().clone(),
            });
        }
        Ok(())
    }

    /// Identify `query` against the gallery.
    pub fn identify(&self, query: &Descriptor) -> Result<MatchResult, MatchError> {
        self.check_query(query)?;
        let start = Instant::now();
        let records = self.store.records();
        let best = if self.cfg.use_parallel {
            scan_parallel(query.as_slice(), records)
        } else {
            scan_sequential(query.as_slice(), records)
        };
        let result = decide(best, records, self.cfg.threshold);

        debug!(
            gallery = records.len(),
            best_distance = best.map(|(d, _)| d),
            threshold = self.cfg.threshold,
            identified = result.is_identified(),
            parallel = self.cfg.use_parallel,
            elapsed_micros = start.elapsed().as_micros(),
            "match_scan"
        );
        Ok(result)
    }

    /// The `k` closest gallery entries, ascending by distance, ignoring the
    /// threshold. Ties keep scan order.
    pub fn candidates(&self, query: &Descriptor, k: usize) -> Result<Vec<Candidate>, MatchError> {
        self.check_query(query)?;
        let records = self.store.records();
        let score = |(pos, record): (usize, &EnrollmentRecord)| {
            (chi_square_distance(query.as_slice(), record.descriptor.as_slice()), pos)
        };
        let mut scored: Vec<Best> = if self.cfg.use_parallel {
            records.par_iter().enumerate().map(score).collect()
        } else {
            records.iter().enumerate().map(score).collect()
        };
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(distance, pos)| Candidate {
                key: records[pos].key,
                distance,
            })
            .collect())
    }
}
