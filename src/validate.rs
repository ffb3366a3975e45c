//! Document Validation
//!
//! Runs a compiled validator over a parsed document and turns the raw
//! violations into caller-facing [`ValidationError`]s: union failures are
//! narrowed to the member the node claims to be, each error gets a "did you
//! mean" suggestion when one is close enough, and errors are localized when
//! the original JSON text is supplied.
//!
//! Every failure mode (unknown type, schema compile error, structural
//! violations) comes back as a [`ValidationResult`]; nothing here panics or
//! returns `Err` for a bad document.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::compose::{ref_target, ComposedSchema};
use crate::engine::Violation;
use crate::error::Result;
use crate::locate::{Anchor, SourceLocation, SourceMap};
use crate::pointer;
use crate::registry::SchemaRegistry;
use crate::report;
use crate::suggest;

/// Bound on `$ref` chains and nested union narrowing
const MAX_DEPTH: usize = 32;

/// Per-call validation settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions<'a> {
    /// Definition to validate against; the schema root when `None`
    pub type_name: Option<&'a str>,
    /// Original JSON text of the document, enabling localization
    pub source_text: Option<&'a str>,
    /// Also render the human-readable report
    pub pretty: bool,
}

impl<'a> ValidateOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_name: &'a str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub fn with_source(mut self, source_text: &'a str) -> Self {
        self.source_text = Some(source_text);
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// One reported problem with a document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Path of the offending value, `/` for the document itself
    pub path: String,
    pub message: String,
    /// Violated keyword, or `parse` / `file` / `schema` for failures that
    /// happen before validation
    pub keyword: String,
    pub params: Map<String, Value>,
    /// Nearest valid alternative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, keyword: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            keyword: keyword.into(),
            params: Map::new(),
            suggestion: None,
            location: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }
}

impl From<Violation> for ValidationError {
    fn from(violation: Violation) -> Self {
        Self {
            path: violation.instance_path,
            message: violation.message,
            keyword: violation.keyword,
            params: violation.params,
            suggestion: None,
            location: None,
        }
    }
}

/// Outcome of one validation call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `true` exactly when `errors` is empty
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty_output: Option<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            pretty_output: None,
        }
    }

    /// A result carrying a single error
    pub fn failure(error: ValidationError) -> Self {
        Self::from_errors(vec![error])
    }

    /// Attach the human-readable report
    pub fn with_pretty(mut self, source_text: Option<&str>) -> Self {
        self.pretty_output = Some(report::render_pretty(&self.errors, source_text));
        self
    }
}

/// Validate a parsed document
pub fn validate(registry: &SchemaRegistry, document: &Value, options: &ValidateOptions<'_>) -> ValidationResult {
    let mut result = ValidationResult::from_errors(collect_errors(registry, document, options));
    if options.pretty {
        result = result.with_pretty(options.source_text);
    }
    result
}

fn collect_errors(registry: &SchemaRegistry, document: &Value, options: &ValidateOptions<'_>) -> Vec<ValidationError> {
    let validator = match registry.compile(options.type_name) {
        Ok(Some(validator)) => validator,
        Ok(None) => return vec![unknown_type(registry, options.type_name.unwrap_or_default())],
        Err(e) => return vec![ValidationError::new(pointer::ROOT, "schema", e.to_string())],
    };

    let schema = registry.schema();
    let type_name = options.type_name.unwrap_or_else(|| schema.root_type());
    let Some(start) = schema.definition(type_name) else {
        return vec![unknown_type(registry, type_name)];
    };

    let violations = match narrow(registry, start, document, validator.check(document), 0) {
        Ok(violations) => violations,
        Err(e) => return vec![ValidationError::new(pointer::ROOT, "schema", e.to_string())],
    };

    let walker = SchemaWalker::new(schema, start);
    let source = options.source_text.map(SourceMap::new);

    violations
        .into_iter()
        .map(|violation| {
            let mut error = ValidationError::from(violation);
            error.suggestion = suggestion_for(&walker, document, &error);
            if let Some(map) = &source {
                let anchor = if error.keyword == "additionalProperties" {
                    Anchor::Key
                } else {
                    Anchor::Value
                };
                error.location = map.locate(&error.path, anchor);
            }
            error
        })
        .collect()
}

fn unknown_type(registry: &SchemaRegistry, name: &str) -> ValidationError {
    let available = registry.type_names();
    let message = format!("Unknown type \"{}\". Available types: {}", name, available.join(", "));
    let params = json!({ "type": name, "availableTypes": available });
    let mut error = ValidationError::new(pointer::ROOT, "type", message).with_params(object(params));
    error.suggestion = suggest::nearest(name, available.iter().map(String::as_str));
    error
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Replace generic union failures with the claimed member's violations
///
/// `violations` are relative to `instance`, which was checked against the
/// definition body `start`.
fn narrow(
    registry: &SchemaRegistry,
    start: &Value,
    instance: &Value,
    violations: Vec<Violation>,
    depth: usize,
) -> Result<Vec<Violation>> {
    let schema = registry.schema();
    let walker = SchemaWalker::new(schema, start);
    let mut narrowed = Vec::with_capacity(violations.len());

    for mut violation in violations {
        if violation.keyword != "oneOf" || violation.params.contains_key("passingSchemas") {
            narrowed.push(violation);
            continue;
        }

        let members = match walker.at(instance, &violation.instance_path) {
            Some(union) => union_members(union),
            None => {
                warn!(path = %violation.instance_path, "union violation outside the schema walk");
                Vec::new()
            }
        };
        if members.is_empty() {
            narrowed.push(violation);
            continue;
        }

        let target = instance.pointer(pointer::to_rfc6901(&violation.instance_path));
        let claimed = target.and_then(node_type);

        if let (Some(target), Some(name)) = (target, claimed) {
            if members.iter().any(|m| *m == name) && depth < MAX_DEPTH {
                if let (Some(validator), Some(body)) = (registry.compile(Some(name))?, schema.definition(name)) {
                    let inner = validator.check(target);
                    if !inner.is_empty() {
                        let prefix = violation.instance_path.clone();
                        let inner = narrow(registry, body, target, inner, depth + 1)?;
                        narrowed.extend(inner.into_iter().map(|v| v.rebased(&prefix)));
                        continue;
                    }
                }
                narrowed.push(violation);
                continue;
            }
        }

        violation.message = match claimed {
            Some(name) => format!("unknown node type \"{}\"; expected one of: {}", name, members.join(", ")),
            None => format!("must be one of: {}", members.join(", ")),
        };
        violation.params.insert("allowedTypes".to_string(), json!(members));
        narrowed.push(violation);
    }

    Ok(narrowed)
}

fn suggestion_for(walker: &SchemaWalker<'_>, document: &Value, error: &ValidationError) -> Option<String> {
    let value = document.pointer(pointer::to_rfc6901(&error.path));
    let candidates = |key: &str| -> Vec<String> {
        match error.params.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    };

    match error.keyword.as_str() {
        "enum" => {
            let input = value?.as_str()?;
            suggest::nearest(input, candidates("allowedValues").iter().map(String::as_str))
        }
        "const" => {
            let input = value?.as_str()?;
            suggest::nearest(input, candidates("allowedValue").iter().map(String::as_str))
        }
        "oneOf" => {
            let input = node_type(value?)?;
            suggest::nearest(input, candidates("allowedTypes").iter().map(String::as_str))
        }
        "additionalProperties" => {
            let name = error.params.get("additionalProperty")?.as_str()?;
            let parent_path = pointer::parent(&error.path);
            let parent = document.pointer(pointer::to_rfc6901(&parent_path))?;
            let present = parent.as_object()?;
            let node = walker.select_member(walker.at(document, &parent_path)?, parent);
            let declared = node.get("properties")?.as_object()?;
            suggest::nearest(
                name,
                declared.keys().map(String::as_str).filter(|k| !present.contains_key(*k)),
            )
        }
        _ => None,
    }
}

/// `type` discriminator of a document node
fn node_type(instance: &Value) -> Option<&str> {
    instance.get("type")?.as_str()
}

/// Definition names referenced by a `oneOf` union
fn union_members(node: &Value) -> Vec<&str> {
    node.get("oneOf")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m.get("$ref")?.as_str())
                .filter_map(ref_target)
                .collect()
        })
        .unwrap_or_default()
}

/// Follows a document path through the composed schema
struct SchemaWalker<'s> {
    schema: &'s ComposedSchema,
    start: &'s Value,
}

impl<'s> SchemaWalker<'s> {
    fn new(schema: &'s ComposedSchema, start: &'s Value) -> Self {
        Self { schema, start }
    }

    /// Schema body governing the value at `path`
    ///
    /// Unions crossed on the way are resolved through the `type` of the
    /// corresponding document node; the body at `path` itself is returned
    /// as is, union or not.
    fn at(&self, instance: &Value, path: &str) -> Option<&'s Value> {
        let mut node = self.resolve(self.start);
        let mut current = instance;
        for segment in pointer::segments(path) {
            node = self.select_member(node, current);
            node = self.resolve(step(node, &segment)?);
            current = instance_child(current, &segment)?;
        }
        Some(node)
    }

    fn resolve(&self, mut node: &'s Value) -> &'s Value {
        for _ in 0..MAX_DEPTH {
            let next = node
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(ref_target)
                .and_then(|target| self.schema.definition(target));
            match next {
                Some(next) => node = next,
                None => break,
            }
        }
        node
    }

    /// The union member `instance` claims to be, or `node` itself
    fn select_member(&self, node: &'s Value, instance: &Value) -> &'s Value {
        match node_type(instance) {
            Some(name) if union_members(node).iter().any(|m| *m == name) => self
                .schema
                .definition(name)
                .map(|body| self.resolve(body))
                .unwrap_or(node),
            _ => node,
        }
    }
}

fn step<'s>(node: &'s Value, segment: &str) -> Option<&'s Value> {
    if let Some(property) = node.get("properties").and_then(|p| p.get(segment)) {
        return Some(property);
    }
    match node.get("items") {
        Some(Value::Array(items)) => return items.get(segment.parse::<usize>().ok()?),
        Some(items @ Value::Object(_)) => return Some(items),
        _ => {}
    }
    node.get("additionalProperties").filter(|v| v.is_object())
}

fn instance_child<'v>(instance: &'v Value, segment: &str) -> Option<&'v Value> {
    match instance {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::embedded().unwrap()
    }

    fn text(value: &str) -> Value {
        json!({ "type": "Text", "value": value })
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "type": "Document",
            "title": [text("Hello")],
            "children": [
                { "type": "Heading", "level": 1, "children": [text("Intro")] },
                { "type": "Paragraph", "children": [text("Body"), { "type": "Emphasis", "children": [text("!")] }] }
            ]
        });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.pretty_output.is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let result = validate(&registry(), &json!({ "type": "Document" }), &ValidateOptions::new());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        let missing: Vec<_> = result
            .errors
            .iter()
            .map(|e| e.params["missingProperty"].as_str().unwrap())
            .collect();
        assert!(missing.contains(&"title"));
        assert!(missing.contains(&"children"));
        for error in &result.errors {
            assert_eq!(error.keyword, "required");
            assert_eq!(error.path, "/");
        }
    }

    #[test]
    fn test_unknown_type_lists_all_types() {
        let registry = registry();
        let options = ValidateOptions::new().with_type("Heading2");
        let result = validate(&registry, &json!({}), &options);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.keyword, "type");
        assert!(error.message.contains("\"Heading2\""));
        for name in registry.type_names() {
            assert!(error.message.contains(&name), "missing {}", name);
        }
        assert_eq!(error.suggestion.as_deref(), Some("Heading"));
    }

    #[test]
    fn test_named_type() {
        let options = ValidateOptions::new().with_type("Text");
        assert!(validate(&registry(), &text("x"), &options).valid);

        let result = validate(&registry(), &json!({ "type": "Text" }), &options);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].params["missingProperty"], "value");
    }

    #[test]
    fn test_union_narrowed_to_member() {
        let doc = json!({
            "type": "Document",
            "title": [],
            "children": [{ "type": "Heading", "level": 9, "children": [] }]
        });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "maximum");
        assert_eq!(result.errors[0].path, "/children/0/level");
    }

    #[test]
    fn test_nested_unions_narrowed() {
        let doc = json!({
            "type": "Document",
            "title": [],
            "children": [{
                "type": "Admonition",
                "kind": "note",
                "children": [{ "type": "Paragraph", "children": [{ "type": "Text" }] }]
            }]
        });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "required");
        assert_eq!(result.errors[0].path, "/children/0/children/0/children/0");
    }

    #[test]
    fn test_unknown_union_member() {
        let doc = json!({
            "type": "Document",
            "title": [],
            "children": [{ "type": "Paragrph", "children": [] }]
        });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.keyword, "oneOf");
        assert_eq!(error.path, "/children/0");
        assert!(error.message.contains("Paragrph"));
        assert!(error.params["allowedTypes"].as_array().unwrap().contains(&json!("Paragraph")));
        assert_eq!(error.suggestion.as_deref(), Some("Paragraph"));
    }

    #[test]
    fn test_enum_and_property_suggestions() {
        let doc = json!({
            "type": "Document",
            "title": [],
            "children": [{ "type": "Admonition", "kind": "warnign", "children": [], "titl": [] }]
        });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);

        let kind = result.errors.iter().find(|e| e.keyword == "enum").unwrap();
        assert_eq!(kind.path, "/children/0/kind");
        assert_eq!(kind.suggestion.as_deref(), Some("warning"));

        let extra = result.errors.iter().find(|e| e.keyword == "additionalProperties").unwrap();
        assert_eq!(extra.path, "/children/0/titl");
        assert_eq!(extra.suggestion.as_deref(), Some("title"));
    }

    #[test]
    fn test_type_mismatch_keyword() {
        let doc = json!({ "type": "Document", "title": "Hello", "children": [] });
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "type");
        assert_eq!(result.errors[0].path, "/title");
        assert!(result.errors[0].suggestion.is_none());
    }

    #[test]
    fn test_localized_with_source() {
        let source = "{\n  \"type\": \"Document\",\n  \"title\": [],\n  \"children\": [],\n  \"extra\": 1\n}";
        let doc: Value = serde_json::from_str(source).unwrap();
        let options = ValidateOptions::new().with_source(source);
        let result = validate(&registry(), &doc, &options);
        assert_eq!(result.errors.len(), 1);
        let location = result.errors[0].location.unwrap();
        assert_eq!((location.line, location.column), (5, 3));

        // Without source text there is no location
        let result = validate(&registry(), &doc, &ValidateOptions::new());
        assert!(result.errors[0].location.is_none());
    }

    #[test]
    fn test_pretty_leaves_errors_untouched() {
        let doc = json!({ "type": "Document" });
        let plain = validate(&registry(), &doc, &ValidateOptions::new());
        let pretty = validate(&registry(), &doc, &ValidateOptions::new().with_pretty(true));
        assert_eq!(plain.errors, pretty.errors);
        let output = pretty.pretty_output.unwrap();
        assert!(output.contains("title"));
        assert!(output.contains("2 errors"));
    }

    #[test]
    fn test_serialized_shape() {
        let result = validate(&registry(), &json!({ "type": "Document" }), &ValidateOptions::new());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["valid"], false);
        assert!(value.get("prettyOutput").is_none());
        let first = &value["errors"][0];
        assert!(first.get("location").is_none());
        assert!(first.get("suggestion").is_none());
        assert_eq!(first["keyword"], "required");
    }

    #[test]
    fn test_repeatable() {
        let registry = registry();
        let doc = json!({ "type": "Document", "title": [], "children": [{ "type": "Lst" }] });
        let first = validate(&registry, &doc, &ValidateOptions::new());
        for _ in 0..5 {
            assert_eq!(validate(&registry, &doc, &ValidateOptions::new()), first);
        }
    }
}
