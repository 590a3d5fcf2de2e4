use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use perceptual::Descriptor;
use serde::{Deserialize, Serialize};

/// Stable subject identifier, e.g. a national ID number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(pub u64);

impl IdentityKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityKey {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(IdentityKey)
    }
}

impl From<u64> for IdentityKey {
    fn from(value: u64) -> Self {
        IdentityKey(value)
    }
}

/// One enrolled subject: its key and reference descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub key: IdentityKey,
    pub descriptor: Descriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_and_parse() {
        let key: IdentityKey = " 5000000001 ".parse().unwrap();
        assert_eq!(key, IdentityKey(5_000_000_001));
        assert_eq!(key.to_string(), "5000000001");
        assert!("nid-1".parse::<IdentityKey>().is_err());
    }

    #[test]
    fn key_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&IdentityKey(42)).unwrap(), "42");
        let back: IdentityKey = serde_json::from_str("42").unwrap();
        assert_eq!(back.get(), 42);
    }
}
