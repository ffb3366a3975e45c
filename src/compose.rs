//! Schema Composition
//!
//! Merges independently authored fragments into one canonical draft-07
//! schema. Every fragment body lands under `definitions/<name>`, its
//! standalone identity (`$schema`, `$id`) is dropped, and fragment-relative
//! references (`./Heading.yaml`) are rewritten into internal pointers
//! (`#/definitions/Heading`).
//!
//! Composition is a pure function of the fragment set and the options: the
//! inputs are never mutated, definitions are keyed in sorted order, and the
//! serialized artifact is byte-identical across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::fragment::SchemaFragment;
use crate::version::SchemaVersion;

/// Dialect marker of the composed schema
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Prefix of canonical internal references
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Top-level keys that only make sense for a standalone fragment
const IDENTITY_KEYS: &[&str] = &["$schema", "$id"];

/// Settings stamped into the composed schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeOptions {
    /// Version used for `version` and the versioned `$id`
    #[serde(default)]
    pub version: SchemaVersion,
    /// Base URL of the canonical identifier
    #[serde(default = "default_id_base")]
    pub id_base: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Entry type the root reference points at
    #[serde(default = "default_root_type")]
    pub root_type: String,
}

fn default_id_base() -> String {
    "https://oxa.dev".to_string()
}

fn default_title() -> String {
    "OXA Schema".to_string()
}

fn default_description() -> String {
    "JSON Schema for OXA document types".to_string()
}

fn default_root_type() -> String {
    "Document".to_string()
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            version: SchemaVersion::default(),
            id_base: default_id_base(),
            title: default_title(),
            description: default_description(),
            root_type: default_root_type(),
        }
    }
}

/// The canonical, internally referenced schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedSchema {
    #[serde(rename = "$schema")]
    pub dialect: String,
    #[serde(rename = "$id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub definitions: BTreeMap<String, Value>,
    /// Root reference, e.g. `#/definitions/Document`
    #[serde(rename = "$ref")]
    pub root: String,
}

impl ComposedSchema {
    /// Name of the entry type
    pub fn root_type(&self) -> &str {
        self.root.strip_prefix(DEFINITIONS_PREFIX).unwrap_or(&self.root)
    }

    /// Definition names, in canonical order
    pub fn type_names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    /// Get one definition body
    pub fn definition(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    /// Whether `name` is a definition
    pub fn has_type(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// The schema as a JSON value
    pub fn to_value(&self) -> Value {
        // A struct of strings and JSON values always serializes
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The published artifact: pretty JSON with a trailing newline
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Read a previously published artifact
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Checksum of the published artifact
    pub fn checksum(&self) -> Result<Checksum> {
        Ok(Checksum::from_text(&self.to_json_pretty()?))
    }
}

/// Compose fragments into one canonical schema
pub fn compose(fragments: &[SchemaFragment], options: &ComposeOptions) -> Result<ComposedSchema> {
    let mut definitions: BTreeMap<String, Value> = BTreeMap::new();
    let mut sources: BTreeMap<&str, &str> = BTreeMap::new();

    for fragment in fragments {
        if let Some(first) = sources.insert(fragment.name.as_str(), fragment.source.as_str()) {
            return Err(SchemaError::DuplicateFragment {
                name: fragment.name.clone(),
                first: first.to_string(),
                second: fragment.source.clone(),
            });
        }
        let body = rewrite_refs(&strip_identity(&fragment.body));
        definitions.insert(fragment.name.clone(), body);
    }

    check_references(&definitions)?;

    if !definitions.contains_key(&options.root_type) {
        return Err(SchemaError::MissingRootType(options.root_type.clone()));
    }

    let composed = ComposedSchema {
        dialect: DRAFT_07.to_string(),
        id: options.version.schema_id(&options.id_base),
        title: options.title.clone(),
        description: options.description.clone(),
        version: options.version.version_string(),
        definitions,
        root: format!("{}{}", DEFINITIONS_PREFIX, options.root_type),
    };

    info!(
        definitions = composed.definitions.len(),
        id = %composed.id,
        "composed schema"
    );

    Ok(composed)
}

/// Copy of a fragment body without its standalone identity keys
fn strip_identity(body: &Value) -> Value {
    match body {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| !IDENTITY_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn fragment_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\./([^/]+)\.(?:ya?ml|json)$").expect("fragment reference pattern is valid")
    })
}

/// Canonical form of a single reference
///
/// `./X.yaml` becomes `#/definitions/X`; canonical and foreign references
/// pass through untouched.
pub fn canonical_ref(reference: &str) -> String {
    match fragment_ref_pattern().captures(reference) {
        Some(caps) => format!("{}{}", DEFINITIONS_PREFIX, &caps[1]),
        None => reference.to_string(),
    }
}

/// Rewrite every `$ref` in a schema tree, producing a new tree
pub fn rewrite_refs(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut result = Map::with_capacity(obj.len());
            for (key, val) in obj {
                let rewritten = match (key.as_str(), val) {
                    ("$ref", Value::String(reference)) => Value::String(canonical_ref(reference)),
                    _ => rewrite_refs(val),
                };
                result.insert(key.clone(), rewritten);
            }
            Value::Object(result)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(rewrite_refs).collect()),
        other => other.clone(),
    }
}

/// Collect every string `$ref` in a schema tree
pub fn collect_refs<'a>(value: &'a Value, refs: &mut BTreeSet<&'a str>) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                match (key.as_str(), val) {
                    ("$ref", Value::String(reference)) => {
                        refs.insert(reference);
                    }
                    _ => collect_refs(val, refs),
                }
            }
        }
        Value::Array(arr) => {
            for val in arr {
                collect_refs(val, refs);
            }
        }
        _ => {}
    }
}

/// Definition named by a canonical reference, if it is one
pub fn ref_target(reference: &str) -> Option<&str> {
    let rest = reference.strip_prefix(DEFINITIONS_PREFIX)?;
    Some(rest.split('/').next().unwrap_or(rest))
}

fn check_references(definitions: &BTreeMap<String, Value>) -> Result<()> {
    for (name, body) in definitions {
        let mut refs = BTreeSet::new();
        collect_refs(body, &mut refs);
        for reference in refs {
            if let Some(target) = ref_target(reference) {
                if !definitions.contains_key(target) {
                    return Err(SchemaError::DanglingReference {
                        from: name.clone(),
                        target: reference.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
