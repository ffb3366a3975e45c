//! Schema versioning utilities

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamped into a composed schema and its canonical `$id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    /// Semantic version (e.g., "1.2.3")
    pub version: Version,
}

impl SchemaVersion {
    /// Create a new schema version
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Create from a version string
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        // Strip leading 'v' if present
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        let version = Version::parse(version_str)?;
        Ok(Self::new(version))
    }

    /// Version of this crate, which ships the embedded fragments
    pub fn current() -> Self {
        Self::new(Version::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        ))
    }

    /// Get the version string (e.g., "1.2.3")
    pub fn version_string(&self) -> String {
        self.version.to_string()
    }

    /// Get the tag string (e.g., "v1.2.3")
    pub fn tag_string(&self) -> String {
        format!("v{}", self.version)
    }

    /// Canonical schema identifier under `base`, e.g.
    /// `https://oxa.dev/v1.2.3/schema.json`
    pub fn schema_id(&self, base: &str) -> String {
        format!("{}/{}/schema.json", base.trim_end_matches('/'), self.tag_string())
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = semver::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaVersion> for String {
    fn from(value: SchemaVersion) -> Self {
        value.version_string()
    }
}
