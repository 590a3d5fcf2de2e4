use hashbrown::HashMap;
use log::{debug, info, warn};
use perceptual::Descriptor;

use crate::key::{EnrollmentRecord, IdentityKey};
use crate::source::{EnrollmentReport, EnrollmentSource, TemplateSource};
use crate::IndexError;

/// Immutable gallery of enrolled descriptors.
///
/// Records keep their insertion order, which is also the scan order the
/// matcher uses for tie-breaking. Once built the store is never mutated, so
/// it can be shared across threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    descriptor_len: usize,
    records: Vec<EnrollmentRecord>,
    positions: HashMap<IdentityKey, usize>,
}

impl TemplateStore {
    fn empty(descriptor_len: usize) -> Self {
        Self {
            descriptor_len,
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Scan an enrollment directory over its key range.
    ///
    /// A key without a file is counted as missing. A file that the source
    /// cannot turn into a descriptor, or whose descriptor has the wrong
    /// length, is counted as rejected. Neither aborts the scan. Only an
    /// invalid range or a missing directory is an error.
    pub fn build(
        source: &EnrollmentSource,
        descriptor_len: usize,
        loader: &dyn TemplateSource,
    ) -> Result<(Self, EnrollmentReport), IndexError> {
        source.validate()?;
        if !source.directory.is_dir() {
            return Err(IndexError::MissingDirectory(
                source.directory.display().to_string(),
            ));
        }

        let mut store = Self::empty(descriptor_len);
        let mut report = EnrollmentReport::default();

        for key in source.keys() {
            let path = source.path_for(key);
            if !path.is_file() {
                debug!("enroll_skip key={key} reason=missing path={}", path.display());
                report.missing += 1;
                continue;
            }
            match loader.load_template(&path) {
                Ok(descriptor) if descriptor.len() == descriptor_len => {
                    store.insert(EnrollmentRecord { key, descriptor })?;
                    report.loaded += 1;
                }
                Ok(descriptor) => {
                    warn!(
                        "enroll_skip key={key} reason=dimension expected={descriptor_len} actual={}",
                        descriptor.len()
                    );
                    report.rejected += 1;
                }
                Err(err) => {
                    warn!("enroll_skip key={key} reason=load_failed error={err}");
                    report.rejected += 1;
                }
            }
        }

        info!(
            "Loaded {} fingerprints from {} (missing={} rejected={})",
            report.loaded,
            source.directory.display(),
            report.missing,
            report.rejected
        );
        Ok((store, report))
    }

    /// Build a store from records already in memory. Order is preserved.
    pub fn from_records(
        descriptor_len: usize,
        records: impl IntoIterator<Item = EnrollmentRecord>,
    ) -> Result<Self, IndexError> {
        let records = records.into_iter();
        let mut store = Self::empty(descriptor_len);
        store.records.reserve(records.size_hint().0);
        for record in records {
            if record.descriptor.len() != descriptor_len {
                return Err(IndexError::DimensionMismatch {
                    expected: descriptor_len,
                    actual: record.descriptor.len(),
                });
            }
            store.insert(record)?;
        }
        Ok(store)
    }

    fn insert(&mut self, record: EnrollmentRecord) -> Result<(), IndexError> {
        if self.positions.contains_key(&record.key) {
            return Err(IndexError::DuplicateKey(record.key));
        }
        self.positions.insert(record.key, self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, key: IdentityKey) -> Option<&EnrollmentRecord> {
        self.positions.get(&key).map(|&pos| &self.records[pos])
    }

    pub fn descriptor(&self, key: IdentityKey) -> Option<&Descriptor> {
        self.get(key).map(|r| &r.descriptor)
    }

    pub fn contains(&self, key: IdentityKey) -> bool {
        self.positions.contains_key(&key)
    }

    /// Every record in insertion order. Each call starts a fresh pass.
    pub fn all(&self) -> std::slice::Iter<'_, EnrollmentRecord> {
        self.records.iter()
    }

    /// Records as a slice, for callers that split the scan.
    pub fn records(&self) -> &[EnrollmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn descriptor_len(&self) -> usize {
        self.descriptor_len
    }
}
