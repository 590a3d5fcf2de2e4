//! On-disk snapshots of a built store.
//!
//! Layout: 4-byte magic, 1-byte codec tag, then the bincode-encoded
//! [`SnapshotFile`] (zstd-compressed when the tag says so).

use std::fs;
use std::path::Path;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use log::info;
use perceptual::DescriptorMeta;
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::key::EnrollmentRecord;
use crate::store::TemplateStore;
use crate::IndexError;

/// Bump whenever the snapshot layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

const SNAPSHOT_MAGIC: &[u8; 4] = b"NIDS";

/// Compression codec for snapshot payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    None,
    #[default]
    Zstd,
}

impl CompressionCodec {
    fn tag(self) -> u8 {
        match self {
            CompressionCodec::None => 0,
            CompressionCodec::Zstd => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, IndexError> {
        match tag {
            0 => Ok(CompressionCodec::None),
            1 => Ok(CompressionCodec::Zstd),
            other => Err(IndexError::Decode(format!("unknown codec tag {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub codec: CompressionCodec,
    /// Zstd level (1-22). Ignored without compression.
    pub level: i32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl SnapshotConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data),
            CompressionCodec::Zstd => Ok(encode_all(data.as_slice(), self.level)?),
        }
    }
}

fn decompress(codec: CompressionCodec, data: &[u8]) -> Result<Vec<u8>, IndexError> {
    match codec {
        CompressionCodec::None => Ok(data.to_vec()),
        CompressionCodec::Zstd => Ok(decode_all(data)?),
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    schema_version: u16,
    descriptor_len: u64,
    records: Vec<EnrollmentRecord>,
}

impl TemplateStore {
    /// Encode the store into snapshot bytes.
    pub fn to_snapshot_bytes(&self, cfg: &SnapshotConfig) -> Result<Vec<u8>, IndexError> {
        let file = SnapshotFile {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            descriptor_len: self.descriptor_len() as u64,
            records: self.records().to_vec(),
        };
        let payload = cfg.compress(encode_to_vec(&file, standard())?)?;
        let mut out = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 1 + payload.len());
        out.extend_from_slice(SNAPSHOT_MAGIC);
        out.push(cfg.codec.tag());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Decode snapshot bytes. Every template must have been extracted with
    /// the operator described by `expected`.
    pub fn from_snapshot_bytes(bytes: &[u8], expected: &DescriptorMeta) -> Result<Self, IndexError> {
        let descriptor_len = expected.descriptor_len();
        let body = bytes
            .strip_prefix(SNAPSHOT_MAGIC.as_slice())
            .ok_or_else(|| IndexError::Decode("not a template snapshot".into()))?;
        let (&tag, payload) = body
            .split_first()
            .ok_or_else(|| IndexError::Decode("truncated snapshot header".into()))?;
        let raw = decompress(CompressionCodec::from_tag(tag)?, payload)?;
        let (file, _): (SnapshotFile, usize) = decode_from_slice(&raw, standard())?;

        if file.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IndexError::UnsupportedSchema {
                found: file.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if file.descriptor_len != descriptor_len as u64 {
            return Err(IndexError::DimensionMismatch {
                expected: descriptor_len,
                actual: file.descriptor_len as usize,
            });
        }
        if let Some(record) = file.records.iter().find(|r| r.descriptor.meta() != expected) {
            return Err(IndexError::IncompatibleTemplate {
                key: record.key,
                expected: expected.clone(),
                actual: record.descriptor.meta().clone(),
            });
        }
        TemplateStore::from_records(descriptor_len, file.records)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>, cfg: &SnapshotConfig) -> Result<(), IndexError> {
        let path = path.as_ref();
        let bytes = self.to_snapshot_bytes(cfg)?;
        fs::write(path, &bytes)?;
        info!(
            "snapshot_saved path={} records={} bytes={}",
            path.display(),
            self.len(),
            bytes.len()
        );
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>, expected: &DescriptorMeta) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let store = Self::from_snapshot_bytes(&bytes, expected)?;
        info!("snapshot_loaded path={} records={}", path.display(), store.len());
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use perceptual::{Descriptor, DescriptorMeta, TextureConfig};
    use tempfile::tempdir;

    use super::*;
    use crate::key::IdentityKey;

    // Two points, so four bins.
    fn texture() -> TextureConfig {
        TextureConfig::new().with_radius(1).with_points(2)
    }

    fn meta() -> DescriptorMeta {
        DescriptorMeta::for_config(&texture())
    }

    fn store_with(meta: &DescriptorMeta) -> TemplateStore {
        let records = (1..=3u64).map(|k| EnrollmentRecord {
            key: IdentityKey(k),
            descriptor: Descriptor::from_bins(
                vec![k as f64 / 10.0, 1.0 - k as f64 / 10.0, 0.0, 0.0],
                meta.clone(),
            )
            .unwrap(),
        });
        TemplateStore::from_records(4, records).unwrap()
    }

    fn store() -> TemplateStore {
        store_with(&meta())
    }

    fn keys(store: &TemplateStore) -> Vec<u64> {
        store.all().map(|r| r.key.get()).collect()
    }

    fn raw_snapshot(file: &SnapshotFile) -> Vec<u8> {
        let mut bytes = SNAPSHOT_MAGIC.to_vec();
        bytes.push(CompressionCodec::None.tag());
        bytes.extend(encode_to_vec(file, standard()).unwrap());
        bytes
    }

    #[test]
    fn snapshot_restores_records_in_order() {
        for codec in [CompressionCodec::None, CompressionCodec::Zstd] {
            let original = store();
            let bytes = original
                .to_snapshot_bytes(&SnapshotConfig::default().with_codec(codec))
                .unwrap();
            let restored = TemplateStore::from_snapshot_bytes(&bytes, &meta()).unwrap();
            assert_eq!(keys(&restored), vec![1, 2, 3]);
            assert_eq!(restored.records(), original.records());
        }
    }

    #[test]
    fn snapshot_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gallery.snap");
        store().save_snapshot(&path, &SnapshotConfig::default()).unwrap();
        let restored = TemplateStore::load_snapshot(&path, &meta()).unwrap();
        assert_eq!(restored.len(), 3);
        assert!(restored.contains(IdentityKey(2)));
    }

    #[test]
    fn snapshot_with_other_descriptor_length_is_rejected() {
        let bytes = store().to_snapshot_bytes(&SnapshotConfig::default()).unwrap();
        let expected = DescriptorMeta::for_config(&TextureConfig::default());
        let err = TemplateStore::from_snapshot_bytes(&bytes, &expected).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 26,
                actual: 4
            }
        );
    }

    #[test]
    fn snapshot_from_other_radius_is_rejected() {
        let radius_two = DescriptorMeta::for_config(&texture().with_radius(2));
        let bytes = store_with(&radius_two)
            .to_snapshot_bytes(&SnapshotConfig::default())
            .unwrap();
        assert_eq!(
            TemplateStore::from_snapshot_bytes(&bytes, &meta()).unwrap_err(),
            IndexError::IncompatibleTemplate {
                key: IdentityKey(1),
                expected: meta(),
                actual: radius_two,
            }
        );
    }

    #[test]
    fn snapshot_with_invalid_bins_is_rejected() {
        // Serialized by hand: a negative bin cannot be built through the API.
        #[derive(Serialize)]
        struct LooseDescriptor {
            bins: Vec<f64>,
            meta: DescriptorMeta,
        }
        #[derive(Serialize)]
        struct LooseRecord {
            key: IdentityKey,
            descriptor: LooseDescriptor,
        }
        #[derive(Serialize)]
        struct LooseFile {
            schema_version: u16,
            descriptor_len: u64,
            records: Vec<LooseRecord>,
        }
        let file = LooseFile {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            descriptor_len: 4,
            records: vec![LooseRecord {
                key: IdentityKey(1),
                descriptor: LooseDescriptor {
                    bins: vec![1.5, -0.5, 0.0, 0.0],
                    meta: meta(),
                },
            }],
        };
        let mut bytes = SNAPSHOT_MAGIC.to_vec();
        bytes.push(CompressionCodec::None.tag());
        bytes.extend(encode_to_vec(&file, standard()).unwrap());
        assert!(matches!(
            TemplateStore::from_snapshot_bytes(&bytes, &meta()),
            Err(IndexError::Decode(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        for bytes in [&b"hello world"[..], b"NIDS", b"NIDS\x07abc"] {
            assert!(matches!(
                TemplateStore::from_snapshot_bytes(bytes, &meta()),
                Err(IndexError::Decode(_))
            ));
        }
    }

    #[test]
    fn future_schema_is_rejected() {
        let bytes = raw_snapshot(&SnapshotFile {
            schema_version: SNAPSHOT_SCHEMA_VERSION + 1,
            descriptor_len: 4,
            records: Vec::new(),
        });
        assert_eq!(
            TemplateStore::from_snapshot_bytes(&bytes, &meta()).unwrap_err(),
            IndexError::UnsupportedSchema {
                found: SNAPSHOT_SCHEMA_VERSION + 1,
                expected: SNAPSHOT_SCHEMA_VERSION
            }
        );
    }

    #[test]
    fn missing_snapshot_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = TemplateStore::load_snapshot(dir.path().join("none.snap"), &meta()).unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }
}
