//! Schema Fragment Loading
//!
//! Each document-node type is authored as its own YAML file (`Heading.yaml`,
//! `Paragraph.yaml`, ...). Fragments are loaded from a directory at runtime or
//! from the copies embedded into the binary at compile time, and always come
//! back sorted by name so that composition never depends on directory order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};

/// Fragments shipped with the crate
static EMBEDDED_FRAGMENTS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schema");

/// File extensions recognised as schema fragments
pub const FRAGMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// One independently authored schema describing a single node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFragment {
    /// Type name, derived from the file stem (e.g. "Heading")
    pub name: String,
    /// Where the fragment came from, for error messages
    pub source: String,
    /// Parsed fragment body
    pub body: Value,
}

impl SchemaFragment {
    /// Create a fragment from an already parsed body
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
            body,
        }
    }

    /// Parse fragment text. YAML is a superset of JSON, so one parser
    /// handles every supported extension.
    pub fn parse(name: impl Into<String>, source: impl Into<String>, content: &str) -> Result<Self> {
        let name = name.into();
        let body: Value = serde_yaml::from_str(content).map_err(|e| SchemaError::FragmentParse {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        if !body.is_object() {
            return Err(SchemaError::FragmentParse {
                name,
                reason: "fragment body must be a mapping".to_string(),
            });
        }

        Ok(Self {
            name,
            source: source.into(),
            body,
        })
    }
}

/// Whether `path` looks like a schema fragment file
pub fn is_fragment_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAGMENT_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Fragment name for a file path (its stem)
fn fragment_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Load all fragments from a directory (non-recursive)
pub fn load_from_directory(dir: &Path) -> Result<Vec<SchemaFragment>> {
    if !dir.is_dir() {
        return Err(SchemaError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut fragments = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| SchemaError::Io(e.into()))?;
        let path = entry.path();
        if !path.is_file() || !is_fragment_file(path) {
            continue;
        }
        let Some(name) = fragment_name(path) else {
            continue;
        };

        let content = fs::read_to_string(path)?;
        debug!(fragment = %name, path = %path.display(), "loaded schema fragment");
        fragments.push(SchemaFragment::parse(name, path.display().to_string(), &content)?);
    }

    if fragments.is_empty() {
        return Err(SchemaError::NoFragments(dir.display().to_string()));
    }

    sort_unique(fragments)
}

/// Load the fragments embedded at compile time (compiled via include_dir!)
pub fn load_embedded() -> Result<Vec<SchemaFragment>> {
    let mut fragments = Vec::new();
    for file in EMBEDDED_FRAGMENTS.files() {
        let path = file.path();
        if !is_fragment_file(path) {
            continue;
        }
        let (Some(name), Some(content)) = (fragment_name(path), file.contents_utf8()) else {
            continue;
        };
        fragments.push(SchemaFragment::parse(
            name,
            format!("embedded:{}", path.display()),
            content,
        )?);
    }

    if fragments.is_empty() {
        return Err(SchemaError::NoFragments("embedded schema".to_string()));
    }

    sort_unique(fragments)
}

/// Sort fragments by name, rejecting two fragments claiming the same name
pub fn sort_unique(fragments: Vec<SchemaFragment>) -> Result<Vec<SchemaFragment>> {
    let mut by_name: BTreeMap<String, SchemaFragment> = BTreeMap::new();
    for fragment in fragments {
        if let Some(existing) = by_name.get(&fragment.name) {
            return Err(SchemaError::DuplicateFragment {
                name: fragment.name.clone(),
                first: existing.source.clone(),
                second: fragment.source,
            });
        }
        by_name.insert(fragment.name.clone(), fragment);
    }
    Ok(by_name.into_values().collect())
}
