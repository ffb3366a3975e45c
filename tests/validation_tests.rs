//! Document validation tests
//!
//! End-to-end checks over the embedded schema: files and text in, structured
//! errors out.

use std::path::{Path, PathBuf};

use oxa_schema::{
    validate, validate_path, validate_text, Encoding, SchemaRegistry, ValidateOptions, ValidationError,
    ValidationResult,
};
use serde_json::{json, Value};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::embedded().expect("embedded schema composes")
}

fn find<'a>(result: &'a ValidationResult, path: &str, keyword: &str) -> &'a ValidationError {
    result
        .errors
        .iter()
        .find(|e| e.path == path && e.keyword == keyword)
        .unwrap_or_else(|| panic!("no {} error at {} in {:#?}", keyword, path, result.errors))
}

// =============================================================================
// Valid documents
// =============================================================================

#[test]
fn test_valid_json_file() {
    let result = validate_path(&registry(), &fixture("valid_document.json"), &ValidateOptions::new());
    assert!(result.valid, "{:#?}", result.errors);
    assert!(result.errors.is_empty());
}

#[test]
fn test_valid_yaml_file() {
    let result = validate_path(&registry(), &fixture("valid_document.yaml"), &ValidateOptions::new());
    assert!(result.valid, "{:#?}", result.errors);
}

#[test]
fn test_minimal_instance_of_every_type() {
    let registry = registry();
    let inline = json!([{ "type": "Text", "value": "x" }]);
    let minimal: Vec<(&str, Value)> = vec![
        ("Document", json!({ "type": "Document", "title": [], "children": [] })),
        ("Block", json!({ "type": "ThematicBreak" })),
        ("Inline", json!({ "type": "Text", "value": "x" })),
        ("Heading", json!({ "type": "Heading", "level": 3, "children": inline })),
        ("Paragraph", json!({ "type": "Paragraph", "children": [] })),
        ("Code", json!({ "type": "Code", "value": "fn main() {}" })),
        ("ThematicBreak", json!({ "type": "ThematicBreak" })),
        ("List", json!({ "type": "List", "children": [] })),
        ("ListItem", json!({ "type": "ListItem", "children": [] })),
        ("Admonition", json!({ "type": "Admonition", "kind": "caution", "children": [] })),
        ("Text", json!({ "type": "Text", "value": "" })),
        ("Emphasis", json!({ "type": "Emphasis", "children": [] })),
        ("Strong", json!({ "type": "Strong", "children": [] })),
        ("InlineCode", json!({ "type": "InlineCode", "value": "x" })),
    ];

    assert_eq!(minimal.len(), registry.type_names().len());
    for (type_name, instance) in &minimal {
        let result = validate(&registry, instance, &ValidateOptions::new().with_type(type_name));
        assert!(result.valid, "{}: {:#?}", type_name, result.errors);
    }
}

// =============================================================================
// Error taxonomy
// =============================================================================

#[test]
fn test_missing_required_one_error_per_field() {
    let result = validate_path(&registry(), &fixture("missing_required.json"), &ValidateOptions::new());
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);

    for field in ["title", "children"] {
        let error = result
            .errors
            .iter()
            .find(|e| e.params.get("missingProperty") == Some(&json!(field)))
            .unwrap_or_else(|| panic!("no error for {}", field));
        assert_eq!(error.keyword, "required");
        assert!(error.message.contains(field));
        let location = error.location.expect("JSON files are localized");
        assert_eq!((location.line, location.column, location.offset), (1, 1, 0));
    }
}

#[test]
fn test_unknown_type_single_error() {
    let registry = registry();
    let result = validate(&registry, &json!({}), &ValidateOptions::new().with_type("Figure"));
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);

    let error = &result.errors[0];
    assert_eq!(error.keyword, "type");
    assert!(error.message.contains("Figure"));
    for name in registry.type_names() {
        assert!(error.message.contains(&name));
    }
}

#[test]
fn test_malformed_json_never_validated() {
    let result = validate_path(&registry(), &fixture("malformed.json"), &ValidateOptions::new());
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].keyword, "parse");
    assert!(result.errors[0].message.contains("JSON"));

    // Even with an unknown type the parse error wins
    let result = validate_text(
        &registry(),
        "{ not valid json",
        Encoding::Json,
        &ValidateOptions::new().with_type("Nope"),
    );
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].keyword, "parse");
}

#[test]
fn test_missing_file() {
    let result = validate_path(&registry(), &fixture("does_not_exist.json"), &ValidateOptions::new());
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].keyword, "file");
    assert!(result.errors[0].message.contains("Failed to read file"));
}

#[test]
fn test_yaml_file_errors_have_no_location() {
    let result = validate_path(&registry(), &fixture("invalid_document.yaml"), &ValidateOptions::new());
    assert_eq!(result.errors.len(), 1);
    let error = find(&result, "/children/0", "required");
    assert_eq!(error.params["missingProperty"], "level");
    assert!(error.location.is_none());
}

// =============================================================================
// Narrowing, suggestions, localization
// =============================================================================

#[test]
fn test_invalid_blocks_all_reported() {
    let result = validate_path(&registry(), &fixture("invalid_blocks.json"), &ValidateOptions::new());
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 5, "{:#?}", result.errors);

    let unknown = find(&result, "/children/0", "oneOf");
    assert!(unknown.message.contains("Paragrph"));
    assert_eq!(unknown.suggestion.as_deref(), Some("Paragraph"));
    let location = unknown.location.unwrap();
    assert_eq!((location.line, location.column), (5, 5));

    let level = find(&result, "/children/1/level", "maximum");
    assert_eq!(level.params["limit"], 6);
    let location = level.location.unwrap();
    assert_eq!((location.line, location.column), (6, 35));

    let kind = find(&result, "/children/2/kind", "enum");
    assert_eq!(kind.suggestion.as_deref(), Some("warning"));
    assert_eq!(kind.location.unwrap().line, 9);

    let missing = find(&result, "/children/2", "required");
    assert_eq!(missing.params["missingProperty"], "children");

    let extra = find(&result, "/children/2/chidren", "additionalProperties");
    assert_eq!(extra.suggestion.as_deref(), Some("children"));
    let location = extra.location.unwrap();
    assert_eq!((location.line, location.column), (10, 7));
}

#[test]
fn test_pretty_report() {
    let text = std::fs::read_to_string(fixture("invalid_blocks.json")).unwrap();
    let options = ValidateOptions::new().with_pretty(true);
    let result = validate_text(&registry(), &text, Encoding::Json, &options);

    let report = result.pretty_output.as_deref().unwrap();
    assert!(report.contains("/children/0 (line 5, column 5)"));
    assert!(report.contains("Did you mean \"Paragraph\"?"));
    assert!(report.contains("   9 |       \"kind\": \"warnign\","));
    assert!(report.ends_with("❌ 5 errors\n"));

    let plain = validate_text(&registry(), &text, Encoding::Json, &ValidateOptions::new());
    assert_eq!(plain.errors, result.errors);
}

#[test]
fn test_deterministic_results() {
    let registry = registry();
    let path = fixture("invalid_blocks.json");
    let first = serde_json::to_string(&validate_path(&registry, &path, &ValidateOptions::new())).unwrap();
    for _ in 0..5 {
        let again = serde_json::to_string(&validate_path(&registry, &path, &ValidateOptions::new())).unwrap();
        assert_eq!(first, again);
    }

    // A fresh registry gives the same answer
    let other = serde_json::to_string(&validate_path(&self::registry(), &path, &ValidateOptions::new())).unwrap();
    assert_eq!(first, other);
}

#[test]
fn test_result_json_shape() {
    let result = validate_path(&registry(), &fixture("missing_required.json"), &ValidateOptions::new());
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["valid"], false);
    let error = &value["errors"][0];
    for key in ["path", "message", "keyword", "params", "location"] {
        assert!(error.get(key).is_some(), "missing {}", key);
    }
    assert!(error["location"].get("line").is_some());
    assert!(value.get("prettyOutput").is_none());
}
