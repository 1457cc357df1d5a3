//! Type-safe issue identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of a well-formed issue ID (UUID v4 in simple form)
const ID_LEN: usize = 32;

/// Type-safe wrapper for issue IDs
///
/// Format: 32 lowercase hex characters (e.g., "9f1c3b0e6a2d4c8e9b7a5f3d1e0c2b4a").
/// IDs are only ever minted by a store; request input goes through [`IssueId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse an ID supplied by a client
    ///
    /// Returns `None` for anything that is not a well-formed ID, so callers can
    /// treat malformed input the same as an unknown record.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = s.len() == ID_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(s.to_string()))
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_well_formed() {
        let id = IssueId::generate();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert_eq!(IssueId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(IssueId::generate(), IssueId::generate());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(IssueId::parse("").is_none());
        assert!(IssueId::parse("invalidid123").is_none());
        assert!(IssueId::parse("9F1C3B0E6A2D4C8E9B7A5F3D1E0C2B4A").is_none());
        assert!(IssueId::parse("9f1c3b0e-6a2d-4c8e-9b7a-5f3d1e0c2b4a").is_none());
        assert!(IssueId::parse("zz1c3b0e6a2d4c8e9b7a5f3d1e0c2b4a").is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = IssueId::parse("9f1c3b0e6a2d4c8e9b7a5f3d1e0c2b4a").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"9f1c3b0e6a2d4c8e9b7a5f3d1e0c2b4a\"");
    }
}
