//! Checksum utilities for published schema artifacts

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of a schema artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn from_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in log lines and reports
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        Self::from_text(content) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"title": "OXA Schema"}"#;
        assert_eq!(Checksum::from_text(content), Checksum::from_text(content));
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(Checksum::from_text("a"), Checksum::from_text("b"));
    }

    #[test]
    fn test_checksum_verification() {
        let content = r#"{"definitions": {}}"#;
        let checksum = Checksum::from_text(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("different content"));
        assert_eq!(checksum.short().len(), 12);
    }
}
