//! # NIDPrint matcher
//!
//! Exhaustive nearest-neighbour identification over a
//! [`TemplateStore`](index::TemplateStore).
//!
//! Every enrolled descriptor is compared with the query using
//! [`chi_square_distance`]. The closest entry is accepted when its distance
//! is strictly below the threshold (default `0.3`); otherwise the result is
//! [`MatchResult::NotIdentified`]. The scan is linear in gallery size and
//! always finds the global minimum.
//!
//! ## Ties
//!
//! When several entries share the minimum distance, the one earliest in the
//! store's scan order wins. The parallel scan reduces on
//! `(distance, position)` and therefore picks the same entry.
//!
//! ```
//! use std::sync::Arc;
//! use index::{EnrollmentRecord, IdentityKey, TemplateStore};
//! use matcher::{MatchConfig, MatchResult, Matcher};
//! use perceptual::{Descriptor, DescriptorMeta, TextureConfig};
//!
//! let texture = TextureConfig::new().with_radius(1).with_points(2);
//! let meta = DescriptorMeta::for_config(&texture);
//! let enrolled = Descriptor::from_bins(vec![0.5, 0.25, 0.25, 0.0], meta).unwrap();
//! let store = TemplateStore::from_records(4, vec![EnrollmentRecord {
//!     key: IdentityKey(1),
//!     descriptor: enrolled.clone(),
//! }]).unwrap();
//!
//! let matcher = Matcher::new(Arc::new(store), &texture, MatchConfig::default()).unwrap();
//! assert_eq!(
//!     matcher.identify(&enrolled).unwrap(),
//!     MatchResult::Identified { key: IdentityKey(1), distance: 0.0 }
//! );
//! ```

mod distance;
pub mod engine;
pub mod types;

pub use crate::distance::chi_square_distance;
pub use crate::engine::{match_descriptor, Matcher};
pub use crate::types::{Candidate, MatchConfig, MatchError, MatchResult};
