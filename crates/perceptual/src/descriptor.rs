//! Descriptor and metadata types.
//!
//! A descriptor is the template that gets enrolled and compared. Its schema
//! is part of the public contract: stored snapshots carry it verbatim, so an
//! incompatible change must bump [`crate::TEXTURE_VERSION`].

use serde::{Deserialize, Serialize};

use crate::config::{ExtractionError, TextureConfig};
use crate::{TEXTURE_ALGORITHM, TEXTURE_VERSION};

/// How a descriptor was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptorMeta {
    /// Algorithm identifier, e.g. `"lbp_uniform_v1"`.
    pub algorithm: String,
    /// Texture algorithm version owned by this crate.
    pub texture_version: u16,
    pub radius: u32,
    pub points: u32,
}

impl DescriptorMeta {
    /// Metadata for descriptors extracted with `cfg` by this crate.
    pub fn for_config(cfg: &TextureConfig) -> Self {
        Self {
            algorithm: TEXTURE_ALGORITHM.to_string(),
            texture_version: TEXTURE_VERSION,
            radius: cfg.radius,
            points: cfg.points,
        }
    }

    /// Histogram length of descriptors carrying this metadata.
    pub fn descriptor_len(&self) -> usize {
        self.points as usize + 2
    }
}

/// Normalized texture histogram.
///
/// Bins are non-negative and, for extracted descriptors, sum to 1 within
/// floating-point tolerance. Deserialization applies the same checks as
/// [`Descriptor::from_bins`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "DescriptorRepr")]
pub struct Descriptor {
    bins: Vec<f64>,
    meta: DescriptorMeta,
}

#[derive(Deserialize)]
struct DescriptorRepr {
    bins: Vec<f64>,
    meta: DescriptorMeta,
}

impl TryFrom<DescriptorRepr> for Descriptor {
    type Error = ExtractionError;

    fn try_from(repr: DescriptorRepr) -> Result<Self, Self::Error> {
        Descriptor::from_bins(repr.bins, repr.meta)
    }
}

impl Descriptor {
    pub(crate) fn from_parts(bins: Vec<f64>, meta: DescriptorMeta) -> Self {
        Self { bins, meta }
    }

    /// Build a descriptor from precomputed bins, e.g. a stored template.
    ///
    /// Rejects empty vectors and any negative or non-finite bin.
    pub fn from_bins(bins: Vec<f64>, meta: DescriptorMeta) -> Result<Self, ExtractionError> {
        if bins.is_empty() {
            return Err(ExtractionError::InvalidBins("descriptor has no bins".into()));
        }
        if let Some((idx, value)) = bins
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ExtractionError::InvalidBins(format!(
                "bin {idx} is {value}; bins must be finite and non-negative"
            )));
        }
        Ok(Self { bins, meta })
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.bins
    }

    pub fn meta(&self) -> &DescriptorMeta {
        &self.meta
    }

    pub fn sum(&self) -> f64 {
        self.bins.iter().sum()
    }
}
