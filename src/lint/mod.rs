//! Schema Keyword Linting
//!
//! Strict-mode check run before a schema is compiled: every key found at a
//! schema position must belong to the draft-07 vocabulary or be registered as
//! a custom keyword. Unknown keys are almost always authoring mistakes
//! (`requried`, `additonalProperties`) that a permissive validator would
//! silently ignore.
//!
//! ## Lints
//! 1. **UNKNOWN_KEYWORD**: key outside the vocabulary at a schema position
//! 2. **NOT_A_SCHEMA**: a schema position holds something other than an
//!    object or a boolean

use serde_json::Value;
use std::collections::HashSet;

use crate::error::{Result, SchemaError};

/// Draft-07 keywords
const DRAFT_07_KEYWORDS: &[&str] = &[
    "$schema", "$id", "$ref", "$comment",
    "title", "description", "default", "readOnly", "writeOnly", "examples",
    "multipleOf", "maximum", "exclusiveMaximum", "minimum", "exclusiveMinimum",
    "maxLength", "minLength", "pattern", "format",
    "contentMediaType", "contentEncoding",
    "additionalItems", "items", "maxItems", "minItems", "uniqueItems", "contains",
    "maxProperties", "minProperties", "required", "additionalProperties",
    "definitions", "properties", "patternProperties", "dependencies", "propertyNames",
    "const", "enum", "type",
    "if", "then", "else", "allOf", "anyOf", "oneOf", "not",
];

const UNKNOWN_KEYWORD: &str = "UNKNOWN_KEYWORD";
const NOT_A_SCHEMA: &str = "NOT_A_SCHEMA";

/// Custom keywords carried by the composed schema
const CUSTOM_KEYWORDS: &[&str] = &["version"];

/// Result of linting a schema
#[derive(Debug, Default)]
pub struct LintResult {
    pub schema_id: String,
    pub errors: Vec<LintError>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct LintError {
    pub code: &'static str,
    pub message: String,
    /// Key that triggered the error
    pub keyword: String,
    pub path: String,
}

/// The schema keyword linter
pub struct KeywordLinter {
    known_keywords: HashSet<&'static str>,
}

impl Default for KeywordLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordLinter {
    pub fn new() -> Self {
        Self {
            known_keywords: DRAFT_07_KEYWORDS
                .iter()
                .chain(CUSTOM_KEYWORDS)
                .copied()
                .collect(),
        }
    }

    /// Accept an additional custom keyword
    pub fn with_keyword(mut self, keyword: &'static str) -> Self {
        self.known_keywords.insert(keyword);
        self
    }

    /// Lint a schema for unknown keywords
    pub fn lint(&self, schema_id: &str, schema: &Value) -> LintResult {
        let mut result = LintResult {
            schema_id: schema_id.to_string(),
            ..Default::default()
        };

        self.lint_schema(schema, "", &mut result);
        result
    }

    /// Fail on the first lint error
    pub fn check(&self, schema_id: &str, schema: &Value) -> Result<()> {
        let result = self.lint(schema_id, schema);
        let Some(error) = result.errors.into_iter().next() else {
            return Ok(());
        };

        let path = if error.path.is_empty() {
            schema_id.to_string()
        } else {
            format!("{}:{}", schema_id, error.path)
        };
        Err(match error.code {
            NOT_A_SCHEMA => SchemaError::NotASchema {
                path,
                reason: error.message,
            },
            _ => SchemaError::UnknownKeyword {
                keyword: error.keyword,
                path,
            },
        })
    }

    fn lint_schema(&self, schema: &Value, path: &str, result: &mut LintResult) {
        let obj = match schema {
            Value::Bool(_) => return,
            Value::Object(obj) => obj,
            other => {
                result.errors.push(LintError {
                    code: NOT_A_SCHEMA,
                    message: format!("Expected a schema object or boolean, found {}", other),
                    keyword: path.rsplit('.').next().unwrap_or(path).to_string(),
                    path: path.to_string(),
                });
                return;
            }
        };

        for (key, val) in obj {
            let child_path = join(path, key);

            if !self.known_keywords.contains(key.as_str()) {
                result.errors.push(LintError {
                    code: UNKNOWN_KEYWORD,
                    message: format!("Unknown keyword '{}'. Fix the spelling or register it as a custom keyword.", key),
                    keyword: key.clone(),
                    path: child_path,
                });
                continue;
            }

            match key.as_str() {
                "properties" | "patternProperties" | "definitions" => {
                    if let Some(map) = val.as_object() {
                        for (name, sub) in map {
                            self.lint_schema(sub, &join(&child_path, name), result);
                        }
                    }
                }
                "dependencies" => {
                    if let Some(map) = val.as_object() {
                        for (name, sub) in map {
                            // Array form lists property names, not a schema
                            if !sub.is_array() {
                                self.lint_schema(sub, &join(&child_path, name), result);
                            }
                        }
                    }
                }
                "items" => match val {
                    Value::Array(arr) => self.lint_each(arr, &child_path, result),
                    sub => self.lint_schema(sub, &child_path, result),
                },
                "allOf" | "anyOf" | "oneOf" => {
                    if let Some(arr) = val.as_array() {
                        self.lint_each(arr, &child_path, result);
                    }
                }
                "additionalItems" | "additionalProperties" | "not" | "if" | "then" | "else"
                | "contains" | "propertyNames" => {
                    self.lint_schema(val, &child_path, result);
                }
                _ => {}
            }
        }
    }

    fn lint_each(&self, schemas: &[Value], path: &str, result: &mut LintResult) {
        for (i, sub) in schemas.iter().enumerate() {
            self.lint_schema(sub, &format!("{}[{}]", path, i), result);
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
