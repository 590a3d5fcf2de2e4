use index::IdentityKey;
use matcher::MatchResult;
use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Caller-facing identification outcome.
///
/// Serializes as `{"identified": true, "identity_key": .., "distance": ..}`
/// on a match and as `{"identified": false}` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResponse {
    pub identified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_key: Option<IdentityKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl From<MatchResult> for IdentificationResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            identified: result.is_identified(),
            identity_key: result.key(),
            distance: result.distance(),
            profile: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identified_response_shape() {
        let response = IdentificationResponse::from(MatchResult::Identified {
            key: IdentityKey(5_000_000_042),
            distance: 0.125,
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"identified": true, "identity_key": 5_000_000_042u64, "distance": 0.125})
        );
    }

    #[test]
    fn not_identified_response_is_minimal() {
        let response = IdentificationResponse::from(MatchResult::NotIdentified);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"identified": false})
        );
        let back: IdentificationResponse = serde_json::from_str(r#"{"identified": false}"#).unwrap();
        assert_eq!(back, response);
    }
}
