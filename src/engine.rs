//! Constraint Engine
//!
//! The narrow seam between the registry and whatever evaluates JSON Schema
//! constraints. The registry only ever sees [`ConstraintEngine::compile`] and
//! [`Validator::check`]; the default engine is backed by the `jsonschema`
//! crate (draft 7) and translates its errors into keyword-tagged
//! [`Violation`]s.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::pointer;

/// A single constraint breach, before localization and formatting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Path of the offending value in the document
    pub instance_path: String,
    /// Path of the violated keyword in the compiled schema
    pub schema_path: String,
    /// Violated keyword (`required`, `type`, `enum`, `oneOf`, ...)
    pub keyword: String,
    /// Keyword-specific parameters (e.g. `missingProperty`)
    pub params: Map<String, Value>,
    pub message: String,
}

impl Violation {
    pub fn new(
        instance_path: impl Into<String>,
        keyword: impl Into<String>,
        params: Map<String, Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            schema_path: String::new(),
            keyword: keyword.into(),
            params,
            message: message.into(),
        }
    }

    fn at_schema(mut self, schema_path: &str) -> Self {
        self.schema_path = schema_path.to_string();
        self
    }

    /// Same violation re-rooted below `prefix`
    pub fn rebased(mut self, prefix: &str) -> Self {
        self.instance_path = pointer::join(prefix, &self.instance_path);
        self
    }
}

/// A compiled, reusable, side-effect-free predicate
pub trait Validator: Send + Sync {
    /// Evaluate the whole instance and return every violation
    fn check(&self, instance: &Value) -> Vec<Violation>;
}

/// Something that turns a schema into a [`Validator`]
pub trait ConstraintEngine: Send + Sync {
    /// Compile `schema`; the error is a human-readable reason
    fn compile(&self, schema: &Value) -> Result<Box<dyn Validator>, String>;
}

/// Engine backed by the `jsonschema` crate
#[derive(Debug, Clone, Copy)]
pub struct JsonSchemaEngine {
    draft: Draft,
}

impl JsonSchemaEngine {
    pub fn new(draft: Draft) -> Self {
        Self { draft }
    }
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self::new(Draft::Draft7)
    }
}

impl ConstraintEngine for JsonSchemaEngine {
    fn compile(&self, schema: &Value) -> Result<Box<dyn Validator>, String> {
        let compiled = JSONSchema::options()
            .with_draft(self.draft)
            .compile(schema)
            .map_err(|e| e.to_string())?;
        Ok(Box::new(JsonSchemaValidator { compiled }))
    }
}

struct JsonSchemaValidator {
    compiled: JSONSchema,
}

impl Validator for JsonSchemaValidator {
    fn check(&self, instance: &Value) -> Vec<Violation> {
        match self.compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.flat_map(violations_from).collect(),
        }
    }
}

/// JSON type name of a value, as used in messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn list(values: &Value) -> String {
    match values {
        Value::Array(items) => items
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Translate one engine error into violations
///
/// `additionalProperties` fans out into one violation per unexpected
/// property, pointing at the property itself.
fn violations_from(error: ValidationError<'_>) -> Vec<Violation> {
    let fallback = error.to_string();
    let path = pointer::normalize(&error.instance_path.to_string());
    let schema_path = error.schema_path.to_string();
    let found = json_type(&error.instance);

    let single = |keyword: &str, p: Value, message: String| {
        vec![Violation::new(path.clone(), keyword, params(p), message).at_schema(&schema_path)]
    };

    match error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            let message = format!("missing required property \"{}\"", name);
            single("required", json!({ "missingProperty": name }), message)
        }
        ValidationErrorKind::Type { kind } => {
            let expected = match kind {
                TypeKind::Single(t) => t.to_string(),
                TypeKind::Multiple(types) => types
                    .into_iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(" | "),
            };
            let message = format!("must be {}, found {}", expected, found);
            single("type", json!({ "type": expected }), message)
        }
        ValidationErrorKind::Enum { options } => {
            let message = format!("must be one of: {}", list(&options));
            single("enum", json!({ "allowedValues": options }), message)
        }
        ValidationErrorKind::Constant { expected_value } => {
            let message = format!("must be equal to {}", expected_value);
            single("const", json!({ "allowedValue": expected_value }), message)
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .into_iter()
            .map(|name| {
                let message = format!("unexpected property \"{}\"", name);
                Violation::new(
                    pointer::child(&path, &name),
                    "additionalProperties",
                    params(json!({ "additionalProperty": name })),
                    message,
                )
                .at_schema(&schema_path)
            })
            .collect(),
        ValidationErrorKind::OneOfNotValid => single(
            "oneOf",
            json!({}),
            "does not match any of the allowed schemas".to_string(),
        ),
        ValidationErrorKind::OneOfMultipleValid => single(
            "oneOf",
            json!({ "passingSchemas": "multiple" }),
            "matches more than one of the allowed schemas".to_string(),
        ),
        ValidationErrorKind::AnyOf => single(
            "anyOf",
            json!({}),
            "does not match any of the allowed schemas".to_string(),
        ),
        ValidationErrorKind::Minimum { limit } => {
            let message = format!("must be >= {}", limit);
            single("minimum", json!({ "comparison": ">=", "limit": limit }), message)
        }
        ValidationErrorKind::Maximum { limit } => {
            let message = format!("must be <= {}", limit);
            single("maximum", json!({ "comparison": "<=", "limit": limit }), message)
        }
        ValidationErrorKind::MinItems { limit } => {
            let message = format!("must not have fewer than {} items", limit);
            single("minItems", json!({ "limit": limit }), message)
        }
        ValidationErrorKind::MaxItems { limit } => {
            let message = format!("must not have more than {} items", limit);
            single("maxItems", json!({ "limit": limit }), message)
        }
        ValidationErrorKind::MinLength { limit } => {
            let message = format!("must not be shorter than {} characters", limit);
            single("minLength", json!({ "limit": limit }), message)
        }
        ValidationErrorKind::MaxLength { limit } => {
            let message = format!("must not be longer than {} characters", limit);
            single("maxLength", json!({ "limit": limit }), message)
        }
        ValidationErrorKind::Pattern { pattern } => {
            let message = format!("must match pattern \"{}\"", pattern);
            single("pattern", json!({ "pattern": pattern }), message)
        }
        ValidationErrorKind::Format { format } => {
            let format = format.to_string();
            let message = format!("must match format \"{}\"", format);
            single("format", json!({ "format": format }), message)
        }
        _ => {
            let keyword = schema_path
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("schema")
                .to_string();
            single(&keyword, json!({}), fallback)
        }
    }
}
